//! Token domain types: whitelisted contracts and wallet holdings.
//!
//! The registry is built once at startup from configuration and shared
//! immutably (`Arc`) with every query. Holdings are produced fresh per
//! query and never persisted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::address::parse_address;
use super::error::RegistryError;

/// Network selector as written in configuration (e.g. `mainnet`).
pub type Network = String;

/// Token standard of a whitelisted contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStandard {
    /// ERC-20 style: interchangeable units.
    Fungible,
    /// ERC-721 style: one identifier per unit.
    NonFungible,
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fungible => write!(f, "ERC20"),
            Self::NonFungible => write!(f, "ERC721"),
        }
    }
}

/// A single whitelisted token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescriptor {
    pub network: Network,
    pub standard: TokenStandard,
    pub symbol: String,
    pub address: Address,
}

/// Raw whitelist entry before validation.
#[derive(Debug, Clone)]
pub struct WhitelistEntry {
    pub network: Network,
    pub standard: TokenStandard,
    pub symbol: String,
    pub address: String,
}

/// Whitelisted contracts of one network, split by standard.
///
/// Symbols iterate in sorted order so snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkContracts {
    pub fungible: BTreeMap<String, ContractDescriptor>,
    pub non_fungible: BTreeMap<String, ContractDescriptor>,
}

impl NetworkContracts {
    /// Contracts of one standard, keyed by symbol.
    pub const fn by_standard(&self, standard: TokenStandard) -> &BTreeMap<String, ContractDescriptor> {
        match standard {
            TokenStandard::Fungible => &self.fungible,
            TokenStandard::NonFungible => &self.non_fungible,
        }
    }

    /// All descriptors, fungible first, each group in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &ContractDescriptor> {
        self.fungible.values().chain(self.non_fungible.values())
    }

    pub fn len(&self) -> usize {
        self.fungible.len() + self.non_fungible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable network → standard → symbol → contract mapping.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    networks: HashMap<Network, NetworkContracts>,
    empty: NetworkContracts,
}

impl ContractRegistry {
    /// Build and validate the registry.
    ///
    /// Rejects malformed or zero addresses and any `(network, symbol)`
    /// pair seen twice, including across standards.
    pub fn from_entries(
        entries: impl IntoIterator<Item = WhitelistEntry>,
    ) -> Result<Self, RegistryError> {
        let mut networks: HashMap<Network, NetworkContracts> = HashMap::new();

        for entry in entries {
            let address = parse_address(&entry.address).ok_or_else(|| {
                RegistryError::MalformedAddress {
                    network: entry.network.clone(),
                    symbol: entry.symbol.clone(),
                    value: entry.address.clone(),
                }
            })?;

            if address.is_zero() {
                return Err(RegistryError::ZeroAddress {
                    network: entry.network,
                    symbol: entry.symbol,
                });
            }

            let contracts = networks.entry(entry.network.clone()).or_default();
            if contracts.fungible.contains_key(&entry.symbol)
                || contracts.non_fungible.contains_key(&entry.symbol)
            {
                return Err(RegistryError::DuplicateSymbol {
                    network: entry.network,
                    symbol: entry.symbol,
                });
            }

            let descriptor = ContractDescriptor {
                network: entry.network,
                standard: entry.standard,
                symbol: entry.symbol.clone(),
                address,
            };

            match entry.standard {
                TokenStandard::Fungible => contracts.fungible.insert(entry.symbol, descriptor),
                TokenStandard::NonFungible => {
                    contracts.non_fungible.insert(entry.symbol, descriptor)
                }
            };
        }

        Ok(Self {
            networks,
            empty: NetworkContracts::default(),
        })
    }

    /// Contracts for a network. Unknown networks yield an empty mapping.
    pub fn lookup(&self, network: &str) -> &NetworkContracts {
        self.networks.get(network).unwrap_or(&self.empty)
    }

    /// Configured network names, sorted.
    pub fn networks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A wallet's nonzero position in one whitelisted contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    pub standard: TokenStandard,
    pub contract_address: Address,
    /// Symbol reported by the contract itself.
    pub symbol: String,
    /// Raw balance in base units (fungible) or token count (non-fungible).
    pub balance: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    /// `balance` scaled by `decimals`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whole_balance: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub token_ids: BTreeSet<U256>,
}

impl TokenHolding {
    /// Fungible holding, or `None` for a zero balance.
    pub fn fungible(contract_address: Address, symbol: String, balance: U256, decimals: u8) -> Option<Self> {
        if balance.is_zero() {
            return None;
        }
        Some(Self {
            standard: TokenStandard::Fungible,
            contract_address,
            symbol,
            balance,
            decimals: Some(decimals),
            whole_balance: format_units(balance, decimals).ok(),
            token_ids: BTreeSet::new(),
        })
    }

    /// Non-fungible holding whose balance is the id count, or `None` if empty.
    pub fn non_fungible(contract_address: Address, symbol: String, token_ids: BTreeSet<U256>) -> Option<Self> {
        if token_ids.is_empty() {
            return None;
        }
        Some(Self {
            standard: TokenStandard::NonFungible,
            contract_address,
            symbol,
            balance: U256::from(token_ids.len()),
            decimals: None,
            whole_balance: None,
            token_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(network: &str, standard: TokenStandard, symbol: &str, address: &str) -> WhitelistEntry {
        WhitelistEntry {
            network: network.into(),
            standard,
            symbol: symbol.into(),
            address: address.into(),
        }
    }

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const AZUKI: &str = "0xED5AF388653567Af2F388E6224dC7C4b3241C544";
    const BAYC: &str = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";

    #[test]
    fn test_registry_lookup_splits_by_standard() {
        let registry = ContractRegistry::from_entries([
            entry("mainnet", TokenStandard::Fungible, "usdc", USDC),
            entry("mainnet", TokenStandard::NonFungible, "bayc", BAYC),
            entry("mainnet", TokenStandard::NonFungible, "azuki", AZUKI),
        ])
        .unwrap();

        let mainnet = registry.lookup("mainnet");
        assert_eq!(mainnet.fungible.len(), 1);
        assert_eq!(mainnet.non_fungible.len(), 2);
        assert_eq!(mainnet.by_standard(TokenStandard::Fungible)["usdc"].address, parse_address(USDC).unwrap());

        let order: Vec<&str> = mainnet.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(order, vec!["usdc", "azuki", "bayc"]);
    }

    #[test]
    fn test_unknown_network_is_empty() {
        let registry = ContractRegistry::from_entries([entry("mainnet", TokenStandard::Fungible, "usdc", USDC)]).unwrap();
        assert!(registry.lookup("goerli").is_empty());
        assert_eq!(registry.networks(), vec!["mainnet"]);
    }

    #[test]
    fn test_duplicate_symbol_across_standards_rejected() {
        let err = ContractRegistry::from_entries([
            entry("mainnet", TokenStandard::Fungible, "usdc", USDC),
            entry("mainnet", TokenStandard::NonFungible, "usdc", BAYC),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSymbol { .. }));
    }

    #[test]
    fn test_same_symbol_on_other_network_allowed() {
        let registry = ContractRegistry::from_entries([
            entry("mainnet", TokenStandard::Fungible, "weth", USDC),
            entry("rinkeby", TokenStandard::Fungible, "weth", BAYC),
        ]);
        assert!(registry.is_ok());
    }

    #[test]
    fn test_malformed_and_zero_address_rejected() {
        let err = ContractRegistry::from_entries([entry("mainnet", TokenStandard::Fungible, "usdc", "0x1234")]).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedAddress { .. }));

        let err = ContractRegistry::from_entries([entry("mainnet", TokenStandard::Fungible, "usdc", "")]).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedAddress { .. }));

        let zero = format!("0x{}", "0".repeat(40));
        let err = ContractRegistry::from_entries([entry("mainnet", TokenStandard::Fungible, "usdc", &zero)]).unwrap_err();
        assert!(matches!(err, RegistryError::ZeroAddress { .. }));
    }

    #[test]
    fn test_zero_balance_produces_no_holding() {
        let addr = parse_address(USDC).unwrap();
        assert!(TokenHolding::fungible(addr, "USDC".into(), U256::ZERO, 6).is_none());
        assert!(TokenHolding::non_fungible(addr, "AZUKI".into(), BTreeSet::new()).is_none());
    }

    #[test]
    fn test_fungible_whole_balance() {
        let addr = parse_address(USDC).unwrap();
        let holding = TokenHolding::fungible(addr, "USDC".into(), U256::from(5_250_000u64), 6).unwrap();
        assert_eq!(holding.whole_balance.as_deref(), Some("5.250000"));
        assert_eq!(holding.decimals, Some(6));
    }

    #[test]
    fn test_non_fungible_balance_matches_ids() {
        let addr = parse_address(AZUKI).unwrap();
        let ids: BTreeSet<U256> = [U256::from(3), U256::from(7)].into_iter().collect();
        let holding = TokenHolding::non_fungible(addr, "AZUKI".into(), ids).unwrap();
        assert_eq!(holding.balance, U256::from(2));
        assert_eq!(holding.token_ids.len(), 2);
    }
}
