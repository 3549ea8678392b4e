//! Table rows and colored status lines

use colored::Colorize;
use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use fip_core::application::{
    CheckOutcome, ConstructedProposal, DeployedContract, ExecutedTx, PermissionsReport,
};
use serde_json::Value;
use tabled::{Table, Tabled};

pub fn address(address: &Address) -> String {
    to_checksum(address, None)
}

fn optional_address(address: &Option<Address>) -> String {
    address.as_ref().map(self::address).unwrap_or_else(|| "-".to_string())
}

fn json_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn ok(message: impl AsRef<str>) {
    println!("{}", format!("✓ {}", message.as_ref()).green().bold());
}

pub fn fail(message: impl AsRef<str>) {
    println!("{}", format!("✗ {}", message.as_ref()).red().bold());
}

pub fn heading(message: impl AsRef<str>) {
    println!("{}", message.as_ref().cyan().bold());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{}:", label).bold(), value);
}

#[derive(Tabled)]
pub struct ProposalRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Deploy")]
    pub deploy: bool,
    #[tabled(rename = "Commands")]
    pub commands: String,
    #[tabled(rename = "Title")]
    pub title: String,
}

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Value")]
    value: U256,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct TxRow {
    #[tabled(rename = "Step")]
    label: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Tx")]
    hash: String,
    #[tabled(rename = "Gas")]
    gas_used: U256,
}

#[derive(Tabled)]
struct DeployRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "Address")]
    address: String,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "")]
    status: String,
    #[tabled(rename = "Check")]
    description: String,
    #[tabled(rename = "Call")]
    call: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Actual")]
    actual: String,
}

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "")]
    status: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Holder")]
    holder: String,
    #[tabled(rename = "Address")]
    address: String,
}

pub fn proposals(rows: Vec<ProposalRow>) {
    println!("{}", Table::new(rows));
}

pub fn actions(proposal: &ConstructedProposal) {
    let rows = proposal.actions.iter().enumerate().map(|(i, action)| ActionRow {
        step: i + 1,
        target: action.target_name.clone(),
        address: address(&action.target),
        value: action.value,
        method: action.signature.clone(),
        description: action.description.clone(),
    });
    println!("{}", Table::new(rows));
}

pub fn transactions(transactions: &[ExecutedTx]) {
    if transactions.is_empty() {
        println!("  ○ no transactions sent");
        return;
    }
    let rows = transactions.iter().map(|tx| TxRow {
        label: tx.label.clone(),
        from: address(&tx.from),
        to: tx
            .contract_address
            .map(|a| format!("new {}", address(&a)))
            .unwrap_or_else(|| optional_address(&tx.to)),
        hash: format!("{:?}", tx.hash),
        gas_used: tx.gas_used,
    });
    println!("{}", Table::new(rows));
}

pub fn deployed(contracts: &[DeployedContract]) {
    let rows = contracts.iter().map(|c| DeployRow {
        name: c.name.clone(),
        artifact: c.artifact.clone(),
        address: address(&c.address),
    });
    println!("{}", Table::new(rows));
}

pub fn checks(outcomes: &[CheckOutcome]) {
    if outcomes.is_empty() {
        println!("  ○ no checks declared");
        return;
    }
    let rows = outcomes.iter().map(|o| CheckRow {
        status: if o.passed { "✓".green().to_string() } else { "✗".red().to_string() },
        description: o.description.clone(),
        call: format!("{}.{}", o.target, o.method),
        expected: json_list(&o.expected),
        actual: match (&o.actual, &o.error) {
            (_, Some(error)) => error.clone(),
            (Some(actual), None) => json_list(actual),
            (None, None) => "-".to_string(),
        },
    });
    println!("{}", Table::new(rows));
}

pub fn permissions(report: &PermissionsReport) {
    let rows = report.holders.iter().map(|h| RoleRow {
        status: if h.has_role { "✓".green().to_string() } else { "✗".red().to_string() },
        role: h.role.clone(),
        holder: h.holder.clone(),
        address: h
            .error
            .clone()
            .unwrap_or_else(|| optional_address(&h.address)),
    });
    println!("{}", Table::new(rows));

    for count in &report.counts {
        match (count.passed(), count.actual, &count.error) {
            (true, _, _) => {}
            (false, _, Some(error)) => fail(format!("{}: member count unavailable ({})", count.role, error)),
            (false, actual, None) => fail(format!(
                "{}: {} members on-chain, {} configured",
                count.role,
                actual.map(|a| a.to_string()).unwrap_or_else(|| "?".to_string()),
                count.expected
            )),
        }
    }
}
