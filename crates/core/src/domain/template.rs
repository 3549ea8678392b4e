// Argument Templating
//
// Replaces `{name}` placeholders with registry addresses. `{{` and `}}`
// produce literal braces.

use crate::domain::error::{DomainError, Result};
use crate::domain::registry::AddressRegistry;
use ethers_core::utils::to_checksum;
use serde_json::Value;

/// Template every string inside an argument list (recursively)
pub fn render_args(args: &[Value], registry: &AddressRegistry) -> Result<Vec<Value>> {
    args.iter().map(|arg| render_value(arg, registry)).collect()
}

/// Template a single JSON value
pub fn render_value(value: &Value, registry: &AddressRegistry) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(render_str(s, registry)?)),
        Value::Array(items) => Ok(Value::Array(render_args(items, registry)?)),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                rendered.insert(key.clone(), render_value(item, registry)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

/// Substitute placeholders in a single string
pub fn render_str(input: &str, registry: &AddressRegistry) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                let name = &tail[1..end];
                if is_placeholder_name(name) {
                    let address = registry.address_of(name).map_err(|_| {
                        DomainError::UnknownPlaceholder {
                            placeholder: name.to_string(),
                            input: input.to_string(),
                        }
                    })?;
                    out.push_str(&to_checksum(&address, None));
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }

        // Lone brace, kept verbatim
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::{ContractCategory, ContractRecord};
    use ethers_core::types::Address;
    use serde_json::json;

    fn registry() -> AddressRegistry {
        let mut registry = AddressRegistry::new();
        registry.insert(
            "feiDAOTimelock",
            ContractRecord::new(
                "0xd51dba7a94e1adea403553a8235c302cebf41a3c".parse::<Address>().unwrap(),
                "Timelock",
                ContractCategory::Governance,
            ),
        );
        registry.insert(
            "fei",
            ContractRecord::new(Address::from_low_u64_be(0xfe1), "Fei", ContractCategory::Core),
        );
        registry
    }

    #[test]
    fn test_whole_string_placeholder() {
        let registry = registry();
        let rendered = render_str("{feiDAOTimelock}", &registry).unwrap();
        let expected = registry.address_of("feiDAOTimelock").unwrap();
        assert_eq!(rendered, to_checksum(&expected, None));
        assert!(rendered.eq_ignore_ascii_case("0xd51dba7a94e1adea403553a8235c302cebf41a3c"));
    }

    #[test]
    fn test_nested_arrays_are_rendered() {
        let args = vec![json!(["{fei}", ["{feiDAOTimelock}"]]), json!(1000), json!(true)];
        let registry = registry();
        let rendered = render_args(&args, &registry).unwrap();

        let fei = to_checksum(&Address::from_low_u64_be(0xfe1), None);
        let timelock = to_checksum(&registry.address_of("feiDAOTimelock").unwrap(), None);
        assert_eq!(rendered[0][0], json!(fei));
        assert_eq!(rendered[0][1][0], json!(timelock));
        assert_eq!(rendered[1], json!(1000));
        assert_eq!(rendered[2], json!(true));
    }

    #[test]
    fn test_escaped_and_lone_braces() {
        let registry = registry();
        assert_eq!(render_str("{{fei}}", &registry).unwrap(), "{fei}");
        assert_eq!(render_str("a { b", &registry).unwrap(), "a { b");
        assert_eq!(render_str("{not a name}", &registry).unwrap(), "{not a name}");
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let err = render_str("send to {tribe}", &registry()).unwrap_err();
        match err {
            DomainError::UnknownPlaceholder { placeholder, input } => {
                assert_eq!(placeholder, "tribe");
                assert_eq!(input, "send to {tribe}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
