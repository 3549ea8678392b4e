// Validation Use Cases
//
// On-chain assertions after a proposal ran: declarative checks and the
// expected AccessControl role holders.

use crate::application::construct::resolve_target;
use crate::application::transact::{call_u64, call_view};
use crate::domain::abi::{self, decode_output, role_id, token_to_json, MethodSignature};
use crate::domain::template::render_args;
use crate::domain::{AddressRegistry, Check, PermissionsConfig};
use crate::error::{AppError, Result};
use crate::port::Chain;
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::Address;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Result of one declarative check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub description: String,
    pub target: String,
    pub method: String,
    pub expected: Vec<Value>,
    pub actual: Option<Vec<Value>>,
    pub passed: bool,
    pub error: Option<String>,
}

/// Run every check; failures are reported per check, never short-circuited
pub async fn run_checks(
    chain: &dyn Chain,
    registry: &AddressRegistry,
    checks: &[Check],
) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::with_capacity(checks.len());

    for check in checks {
        let outcome = match evaluate(chain, registry, check).await {
            Ok((expected, actual)) => {
                let passed = expected == actual;
                CheckOutcome {
                    description: check.description.clone(),
                    target: check.target.clone(),
                    method: check.method.clone(),
                    expected: expected.iter().map(token_to_json).collect(),
                    actual: Some(actual.iter().map(token_to_json).collect()),
                    passed,
                    error: None,
                }
            }
            Err(e) => CheckOutcome {
                description: check.description.clone(),
                target: check.target.clone(),
                method: check.method.clone(),
                expected: check.expected.clone(),
                actual: None,
                passed: false,
                error: Some(e.to_string()),
            },
        };

        if outcome.passed {
            info!(target = %outcome.target, method = %outcome.method, "Check passed");
        } else {
            warn!(
                target = %outcome.target,
                method = %outcome.method,
                expected = ?outcome.expected,
                actual = ?outcome.actual,
                error = ?outcome.error,
                "Check failed"
            );
        }
        outcomes.push(outcome);
    }

    outcomes
}

/// Returns (expected, actual) tokens
async fn evaluate(
    chain: &dyn Chain,
    registry: &AddressRegistry,
    check: &Check,
) -> Result<(Vec<Token>, Vec<Token>)> {
    let target = resolve_target(&check.target, registry)?;
    let method = MethodSignature::parse(&check.method)?;
    let args = render_args(&check.arguments, registry)?;
    let calldata = method.encode_call(&args)?;

    let returns = abi::parse_types(&check.returns)?;
    if returns.len() != check.expected.len() {
        return Err(AppError::Validation(format!(
            "{} declares {} return types but {} expected values",
            method.canonical(),
            returns.len(),
            check.expected.len()
        )));
    }

    let expected_values = render_args(&check.expected, registry)?;
    let expected = returns
        .iter()
        .zip(&expected_values)
        .map(|(param, value)| abi::tokenize(param, value))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let raw = chain.call(target, calldata).await?;
    let actual = decode_output(&returns, &raw)?;

    Ok((expected, actual))
}

/// One (role, holder) membership check
#[derive(Debug, Clone, Serialize)]
pub struct RoleHolderCheck {
    pub role: String,
    pub holder: String,
    pub address: Option<Address>,
    pub has_role: bool,
    pub error: Option<String>,
}

/// Role member count against the configured holder list
#[derive(Debug, Clone, Serialize)]
pub struct RoleCountCheck {
    pub role: String,
    pub expected: usize,
    pub actual: Option<u64>,
    pub error: Option<String>,
}

impl RoleCountCheck {
    pub fn passed(&self) -> bool {
        self.actual == Some(self.expected as u64)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionsReport {
    pub holders: Vec<RoleHolderCheck>,
    pub counts: Vec<RoleCountCheck>,
}

impl PermissionsReport {
    pub fn passed(&self) -> bool {
        self.holders.iter().all(|h| h.has_role) && self.counts.iter().all(RoleCountCheck::passed)
    }
}

/// Verify `hasRole` for every configured holder and `getRoleMemberCount` per role
pub async fn verify_permissions(
    chain: &dyn Chain,
    registry: &AddressRegistry,
    core: Address,
    permissions: &PermissionsConfig,
) -> Result<PermissionsReport> {
    let mut report = PermissionsReport::default();

    for (role, holders) in permissions.roles() {
        let role_token = Token::FixedBytes(role_id(role).as_bytes().to_vec());

        for holder in holders {
            let check = match registry.resolve(holder) {
                Ok(address) => {
                    let result = call_view(
                        chain,
                        core,
                        "hasRole(bytes32,address)",
                        &[role_token.clone(), Token::Address(address)],
                        &[ParamType::Bool],
                    )
                    .await;
                    match result.as_deref() {
                        Ok([Token::Bool(has_role)]) => RoleHolderCheck {
                            role: role.to_string(),
                            holder: holder.clone(),
                            address: Some(address),
                            has_role: *has_role,
                            error: None,
                        },
                        Ok(other) => RoleHolderCheck {
                            role: role.to_string(),
                            holder: holder.clone(),
                            address: Some(address),
                            has_role: false,
                            error: Some(format!("unexpected hasRole output: {:?}", other)),
                        },
                        Err(e) => RoleHolderCheck {
                            role: role.to_string(),
                            holder: holder.clone(),
                            address: Some(address),
                            has_role: false,
                            error: Some(e.to_string()),
                        },
                    }
                }
                Err(e) => RoleHolderCheck {
                    role: role.to_string(),
                    holder: holder.clone(),
                    address: None,
                    has_role: false,
                    error: Some(e.to_string()),
                },
            };

            if !check.has_role {
                warn!(role = %role, holder = %holder, error = ?check.error, "Missing role");
            }
            report.holders.push(check);
        }

        let count = call_u64(chain, core, "getRoleMemberCount(bytes32)", &[role_token]).await;
        let count_check = match count {
            Ok(actual) => RoleCountCheck {
                role: role.to_string(),
                expected: holders.len(),
                actual: Some(actual),
                error: None,
            },
            Err(e) => RoleCountCheck {
                role: role.to_string(),
                expected: holders.len(),
                actual: None,
                error: Some(e.to_string()),
            },
        };
        if !count_check.passed() {
            warn!(
                role = %role,
                expected = count_check.expected,
                actual = ?count_check.actual,
                "Role member count mismatch"
            );
        }
        report.counts.push(count_check);
    }

    info!(
        roles = report.counts.len(),
        holders = report.holders.len(),
        passed = report.passed(),
        "Permissions verified"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::selector_of;
    use crate::domain::{ContractCategory, ContractRecord};
    use crate::port::chain::mocks::{MockChain, MockResponse};
    use ethers_core::types::U256;
    use serde_json::json;

    fn registry() -> AddressRegistry {
        let mut registry = AddressRegistry::new();
        registry.insert(
            "fei",
            ContractRecord::new(Address::from_low_u64_be(0xfe1), "Fei", ContractCategory::Core),
        );
        registry.insert(
            "core",
            ContractRecord::new(Address::from_low_u64_be(0xc0), "Core", ContractCategory::Core),
        );
        registry
    }

    fn check(expected: Value) -> Check {
        Check {
            target: "fei".to_string(),
            method: "balanceOf(address)".to_string(),
            arguments: vec![json!("{core}")],
            returns: vec!["uint256".to_string()],
            expected: vec![expected],
            description: "core holds 1000 FEI".to_string(),
        }
    }

    #[tokio::test]
    async fn test_checks_pass_and_fail_independently() {
        let chain = MockChain::new();
        chain.respond(
            Address::from_low_u64_be(0xfe1),
            selector_of("balanceOf(address)"),
            vec![MockResponse::uint(1000)],
        );

        let outcomes = run_checks(
            &chain,
            &registry(),
            &[check(json!("1000")), check(json!(999)), check(json!("not a number"))],
        )
        .await;

        assert!(outcomes[0].passed);
        assert_eq!(outcomes[0].actual, Some(vec![json!("1000")]));
        assert!(!outcomes[1].passed);
        assert!(outcomes[1].error.is_none());
        assert!(!outcomes[2].passed);
        assert!(outcomes[2].error.is_some());
    }

    #[tokio::test]
    async fn test_check_revert_is_reported() {
        let chain = MockChain::new();
        let outcomes = run_checks(&chain, &registry(), &[check(json!("1"))]).await;
        assert!(!outcomes[0].passed);
        assert!(outcomes[0].error.as_deref().unwrap().contains("reverted"));
    }

    #[tokio::test]
    async fn test_verify_permissions() {
        let chain = MockChain::new();
        let core = Address::from_low_u64_be(0xc0);
        chain.respond(core, selector_of("hasRole(bytes32,address)"), vec![MockResponse::bool(true)]);
        chain.respond(
            core,
            selector_of("getRoleMemberCount(bytes32)"),
            vec![MockResponse::tokens(&[Token::Uint(U256::from(1))])],
        );

        let mut permissions = PermissionsConfig::new();
        permissions.grant("MINTER_ROLE", "fei");
        let report = verify_permissions(&chain, &registry(), core, &permissions)
            .await
            .unwrap();
        assert!(report.passed());

        permissions.grant("MINTER_ROLE", "unknownContract");
        let report = verify_permissions(&chain, &registry(), core, &permissions)
            .await
            .unwrap();
        assert!(!report.passed());
        assert!(report.holders[1].address.is_none());
        assert_eq!(report.counts[0].expected, 2);
    }
}
