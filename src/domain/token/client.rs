//! Token sub-client: balances and minting.

use alloy_primitives::{Address, U256};

use crate::client::AgrimarketClient;
use crate::contracts::IUtilityToken;
use crate::domain::token::TokenBalance;
use crate::error::{SdkError, TxError};
use crate::invalidate::Invalidation;
use crate::session::PendingTransaction;

/// Sub-client for the utility token.
pub struct Token<'a> {
    pub(crate) client: &'a AgrimarketClient,
}

impl<'a> Token<'a> {
    pub async fn balance_of(&self, owner: Address) -> Result<TokenBalance, SdkError> {
        let raw = self
            .client
            .gateway
            .token(self.client.reader())
            .call(IUtilityToken::balanceOfCall { owner })
            .await?;
        Ok(TokenBalance::new(owner, raw))
    }

    /// Balance of the connected account.
    pub async fn balance(&self) -> Result<TokenBalance, SdkError> {
        let account = self.client.session.account().ok_or(TxError::WalletRequired)?;
        self.balance_of(account).await
    }

    /// Mint `amount` base units to the connected account.
    pub async fn mint(&self, amount: U256) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let to = executor.account().ok_or(TxError::WalletRequired)?;
        tracing::info!(to = %to, amount = %amount, "minting tokens");
        let pending = self
            .client
            .gateway
            .token(executor)
            .send(IUtilityToken::mintCall { to, amount })
            .await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::TokenBalanceChanged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{client_with, sent_calldata, tokens, FakeChain, BUYER};
    use crate::transport::memory::MemoryWallet;
    use alloy_sol_types::SolCall;

    #[tokio::test]
    async fn test_balance_of_reads_without_session() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        let chain = FakeChain::new();
        chain.set_balance(BUYER, tokens(7));
        chain.install(&wallet);
        let client = client_with(&wallet);

        let balance = client.token().balance_of(BUYER).await.unwrap();
        assert_eq!(balance.to_string(), "7");

        let err = client.token().balance().await.unwrap_err();
        assert!(matches!(err, SdkError::Tx(TxError::WalletRequired)));
    }

    #[tokio::test]
    async fn test_mint_targets_connected_account() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        let client = client_with(&wallet);
        client.session().connect().await.unwrap();

        client.token().mint(tokens(3)).await.unwrap().confirm().await.unwrap();

        let data = sent_calldata(&wallet).pop().unwrap();
        let call = IUtilityToken::mintCall::abi_decode(&data).unwrap();
        assert_eq!(call.to, BUYER);
        assert_eq!(call.amount, tokens(3));
    }
}
