//! The on-chain collection as seen by the pipeline.
//!
//! Only the method surface is modelled here. The pipeline's one hard
//! dependency on the contract is that `base_token_uri` points at the content
//! address the metadata was patched with, see [`check_base_uri`].

use crate::error::MetadataError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Amounts are in the chain's smallest unit
pub type Wei = u128;

/// Read and write surface of the fixed-price ERC721 collection
pub trait CollectionContract {
    fn name(&self) -> String;
    fn symbol(&self) -> String;
    fn owner(&self) -> String;
    fn mint_price(&self) -> Wei;
    /// Maximum number of tokens that can be minted
    fn supply(&self) -> u64;
    /// Number of tokens minted so far, which is also the next token ID
    fn token_ids(&self) -> u64;
    fn base_token_uri(&self) -> String;
    fn max_mint_per_address(&self) -> u64;

    /// Mint the next token to `recipient`, paying `value`
    ///
    /// # Returns
    /// The ID of the minted token
    fn mint(
        &mut self,
        recipient: &str,
        token_uri: &str,
        value: Wei,
    ) -> Result<u64, MetadataError>;

    /// Transfer the collected balance to the owner
    fn withdraw(&mut self, caller: &str) -> Result<Wei, MetadataError>;

    fn update_supply(&mut self, caller: &str, new_supply: u64) -> Result<(), MetadataError>;

    fn update_mint_price(&mut self, caller: &str, new_price: Wei) -> Result<(), MetadataError>;
}

/// Constructor arguments of the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParams {
    pub owner: String,
    pub name: String,
    pub symbol: String,
    pub mint_price: Wei,
    pub max_supply: u64,
    pub base_token_uri: String,
    pub max_mint_per_address: u64,
}

impl DeploymentParams {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: "Quai NFT Collection".to_string(),
            symbol: "QNFT".to_string(),
            mint_price: 5_000_000_000_000_000_000,
            max_supply: 1000,
            base_token_uri: String::new(),
            max_mint_per_address: 5,
        }
    }

    /// Point the base URI at a published content address
    pub fn with_content_address(mut self, scheme: &str, address: &str) -> Self {
        self.base_token_uri = expected_base_uri(scheme, address);
        self
    }
}

/// The base token URI a collection should carry for a content address
pub fn expected_base_uri(scheme: &str, address: &str) -> String {
    format!("{scheme}://{address}/")
}

/// Confirm the contract resolves token URIs under `address`
pub fn check_base_uri<C: CollectionContract + ?Sized>(
    contract: &C,
    scheme: &str,
    address: &str,
) -> Result<(), MetadataError> {
    let expected = expected_base_uri(scheme, address);
    let actual = contract.base_token_uri();
    if actual == expected {
        Ok(())
    } else {
        Err(MetadataError::Contract(format!(
            "base token URI is '{actual}', expected '{expected}'"
        )))
    }
}

/// In-memory collection enforcing price, supply and per-address limits
#[derive(Debug, Clone)]
pub struct MockCollection {
    params: DeploymentParams,
    next_token_id: u64,
    token_uris: HashMap<u64, String>,
    holders: HashMap<u64, String>,
    minted_by: HashMap<String, u64>,
    balance: Wei,
}

impl MockCollection {
    pub fn deploy(params: DeploymentParams) -> Self {
        info!(
            "Deploying {} ({}) with supply {} at base URI {}",
            params.name, params.symbol, params.max_supply, params.base_token_uri
        );
        Self {
            params,
            next_token_id: 0,
            token_uris: HashMap::new(),
            holders: HashMap::new(),
            minted_by: HashMap::new(),
            balance: 0,
        }
    }

    /// Full URI of a minted token
    pub fn token_uri(&self, token_id: u64) -> Option<String> {
        self.token_uris
            .get(&token_id)
            .map(|uri| format!("{}{}", self.params.base_token_uri, uri))
    }

    pub fn owner_of(&self, token_id: u64) -> Option<&str> {
        self.holders.get(&token_id).map(String::as_str)
    }

    pub fn balance(&self) -> Wei {
        self.balance
    }

    fn ensure_owner(&self, caller: &str) -> Result<(), MetadataError> {
        if caller == self.params.owner {
            Ok(())
        } else {
            Err(MetadataError::Contract(format!("{caller} is not the owner")))
        }
    }
}

impl CollectionContract for MockCollection {
    fn name(&self) -> String {
        self.params.name.clone()
    }

    fn symbol(&self) -> String {
        self.params.symbol.clone()
    }

    fn owner(&self) -> String {
        self.params.owner.clone()
    }

    fn mint_price(&self) -> Wei {
        self.params.mint_price
    }

    fn supply(&self) -> u64 {
        self.params.max_supply
    }

    fn token_ids(&self) -> u64 {
        self.next_token_id
    }

    fn base_token_uri(&self) -> String {
        self.params.base_token_uri.clone()
    }

    fn max_mint_per_address(&self) -> u64 {
        self.params.max_mint_per_address
    }

    fn mint(
        &mut self,
        recipient: &str,
        token_uri: &str,
        value: Wei,
    ) -> Result<u64, MetadataError> {
        if value < self.params.mint_price {
            return Err(MetadataError::Contract(format!(
                "insufficient payment: sent {value}, price is {}",
                self.params.mint_price
            )));
        }
        if self.next_token_id >= self.params.max_supply {
            return Err(MetadataError::Contract("max supply reached".to_string()));
        }
        let minted = self.minted_by.get(recipient).copied().unwrap_or(0);
        if minted >= self.params.max_mint_per_address {
            return Err(MetadataError::Contract(format!(
                "{recipient} reached the mint limit of {}",
                self.params.max_mint_per_address
            )));
        }

        let token_id = self.next_token_id;
        self.next_token_id += 1;
        self.token_uris.insert(token_id, token_uri.to_string());
        self.holders.insert(token_id, recipient.to_string());
        self.minted_by.insert(recipient.to_string(), minted + 1);
        self.balance += value;
        Ok(token_id)
    }

    fn withdraw(&mut self, caller: &str) -> Result<Wei, MetadataError> {
        self.ensure_owner(caller)?;
        Ok(std::mem::take(&mut self.balance))
    }

    fn update_supply(&mut self, caller: &str, new_supply: u64) -> Result<(), MetadataError> {
        self.ensure_owner(caller)?;
        if new_supply < self.next_token_id {
            return Err(MetadataError::Contract(format!(
                "supply {new_supply} is below the {} tokens already minted",
                self.next_token_id
            )));
        }
        self.params.max_supply = new_supply;
        Ok(())
    }

    fn update_mint_price(&mut self, caller: &str, new_price: Wei) -> Result<(), MetadataError> {
        self.ensure_owner(caller)?;
        self.params.mint_price = new_price;
        Ok(())
    }
}
