// ABI Helpers
//
// Method signatures are human-readable (`grantRole(bytes32,address)`).
// Arguments arrive as JSON values and are converted to ABI tokens against
// the parameter types of the signature.

use crate::domain::error::{DomainError, Result};
use ethers_core::abi::ethabi::param_type::Reader;
use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::{Address, Bytes, H256, I256, U256};
use ethers_core::utils::{keccak256, to_checksum};
use serde_json::Value;

/// Parsed contract method signature
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    name: String,
    inputs: Vec<ParamType>,
    canonical: String,
    selector: [u8; 4],
}

impl MethodSignature {
    /// Parse `name(type,...)`, optionally prefixed with `function `.
    ///
    /// Parameter names and data locations are tolerated and dropped, so
    /// `transfer(address to, uint256 amount)` parses to `transfer(address,uint256)`.
    pub fn parse(signature: &str) -> Result<Self> {
        let invalid = |reason: &str| DomainError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = signature.trim();
        let trimmed = trimmed.strip_prefix("function ").unwrap_or(trimmed).trim();

        let open = trimmed.find('(').ok_or_else(|| invalid("missing '('"))?;
        let close = matching_paren(trimmed, open).ok_or_else(|| invalid("unbalanced parentheses"))?;

        if !trimmed[close + 1..].trim().is_empty() {
            return Err(invalid("trailing characters"));
        }

        let name = trimmed[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("invalid method name"));
        }

        let inputs = split_top_level(&trimmed[open + 1..close])
            .into_iter()
            .map(|raw| parse_param_type(strip_param_name(raw)).map_err(|e| invalid(&e)))
            .collect::<Result<Vec<_>>>()?;

        let canonical = format!(
            "{}({})",
            name,
            inputs
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        let selector = selector_of(&canonical);

        Ok(Self {
            name: name.to_string(),
            inputs,
            canonical,
            selector,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical form used for the selector (`name(type,...)`, no spaces)
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    pub fn inputs(&self) -> &[ParamType] {
        &self.inputs
    }

    /// Convert JSON arguments to tokens, checking arity and types
    pub fn tokenize_args(&self, args: &[Value]) -> Result<Vec<Token>> {
        if args.len() != self.inputs.len() {
            return Err(DomainError::ArgumentCount {
                method: self.canonical.clone(),
                expected: self.inputs.len(),
                actual: args.len(),
            });
        }
        self.inputs
            .iter()
            .zip(args)
            .map(|(param, value)| tokenize(param, value))
            .collect()
    }

    /// ABI-encoded arguments without the selector
    pub fn encode_params(&self, args: &[Value]) -> Result<Bytes> {
        let tokens = self.tokenize_args(args)?;
        Ok(abi::encode(&tokens).into())
    }

    /// Selector followed by the ABI-encoded arguments
    pub fn encode_call(&self, args: &[Value]) -> Result<Bytes> {
        let tokens = self.tokenize_args(args)?;
        Ok(encode_with_selector(self.selector, &tokens))
    }

    /// Encode already-built tokens (used for governance calls with computed arguments)
    pub fn encode_tokens(&self, tokens: &[Token]) -> Bytes {
        encode_with_selector(self.selector, tokens)
    }
}

/// First four bytes of `keccak256(canonical signature)`
pub fn selector_of(canonical: &str) -> [u8; 4] {
    let hash = keccak256(canonical.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector followed by `abi.encode(tokens)`
pub fn encode_with_selector(selector: [u8; 4], tokens: &[Token]) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 * tokens.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&abi::encode(tokens));
    data.into()
}

/// Parse a list of Solidity type names (`["uint256", "address[]"]`)
pub fn parse_types(types: &[String]) -> Result<Vec<ParamType>> {
    types
        .iter()
        .map(|t| {
            parse_param_type(t.trim()).map_err(|reason| DomainError::InvalidArgument {
                param: t.clone(),
                reason,
            })
        })
        .collect()
}

/// Decode return data against the given output types
pub fn decode_output(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
    abi::decode(types, data).map_err(|e| DomainError::Encoding(e.to_string()))
}

/// Convert a JSON value into a token of the given ABI type
pub fn tokenize(param: &ParamType, value: &Value) -> Result<Token> {
    let invalid = |reason: String| DomainError::InvalidArgument {
        param: param.to_string(),
        reason,
    };

    match param {
        ParamType::Address => {
            let s = expect_str(value).map_err(invalid)?;
            s.parse::<Address>()
                .map(Token::Address)
                .map_err(|e| invalid(format!("{}: {}", s, e)))
        }
        ParamType::Uint(bits) => {
            let n = parse_uint(value).map_err(invalid)?;
            if n.bits() > *bits {
                return Err(invalid(format!("{} does not fit in {} bits", n, bits)));
            }
            Ok(Token::Uint(n))
        }
        ParamType::Int(bits) => {
            check_widths(param).map_err(invalid)?;
            let (negative, magnitude) = parse_int(value).map_err(invalid)?;
            let limit = U256::one() << (*bits - 1);
            let fits = if negative {
                magnitude <= limit
            } else {
                magnitude < limit
            };
            if !fits {
                let sign = if negative { "-" } else { "" };
                return Err(invalid(format!("{}{} does not fit in {} bits", sign, magnitude, bits)));
            }
            let raw = if negative {
                (!magnitude).overflowing_add(U256::one()).0
            } else {
                magnitude
            };
            Ok(Token::Int(raw))
        }
        ParamType::Bool => match value {
            Value::Bool(b) => Ok(Token::Bool(*b)),
            Value::String(s) if s == "true" => Ok(Token::Bool(true)),
            Value::String(s) if s == "false" => Ok(Token::Bool(false)),
            other => Err(invalid(format!("expected boolean, got {}", other))),
        },
        ParamType::String => match value {
            Value::String(s) => Ok(Token::String(s.clone())),
            other => Err(invalid(format!("expected string, got {}", other))),
        },
        ParamType::Bytes => {
            let s = expect_str(value).map_err(invalid)?;
            parse_hex(s).map(Token::Bytes).map_err(invalid)
        }
        ParamType::FixedBytes(len) => {
            let s = expect_str(value).map_err(invalid)?;
            let bytes = parse_hex(s).map_err(invalid)?;
            if bytes.len() != *len {
                return Err(invalid(format!("expected {} bytes, got {}", len, bytes.len())));
            }
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Array(inner) => {
            let items = expect_array(value).map_err(invalid)?;
            items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<Vec<_>>>()
                .map(Token::Array)
        }
        ParamType::FixedArray(inner, len) => {
            let items = expect_array(value).map_err(invalid)?;
            if items.len() != *len {
                return Err(invalid(format!("expected {} elements, got {}", len, items.len())));
            }
            items
                .iter()
                .map(|item| tokenize(inner, item))
                .collect::<Result<Vec<_>>>()
                .map(Token::FixedArray)
        }
        ParamType::Tuple(components) => {
            let items = expect_array(value).map_err(invalid)?;
            if items.len() != components.len() {
                return Err(invalid(format!(
                    "expected {} tuple components, got {}",
                    components.len(),
                    items.len()
                )));
            }
            components
                .iter()
                .zip(items)
                .map(|(component, item)| tokenize(component, item))
                .collect::<Result<Vec<_>>>()
                .map(Token::Tuple)
        }
    }
}

/// Parse a command's `values` field into wei
pub fn wei(value: &Value) -> Result<U256> {
    match value {
        Value::Null => Ok(U256::zero()),
        other => parse_uint(other).map_err(|reason| DomainError::InvalidArgument {
            param: "values".to_string(),
            reason,
        }),
    }
}

/// AccessControl role identifier: `keccak256(name)`
pub fn role_id(name: &str) -> H256 {
    H256::from(keccak256(name.as_bytes()))
}

/// Render a token as JSON (addresses checksummed, integers as decimal strings)
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(a) => Value::String(to_checksum(a, None)),
        Token::Uint(n) => Value::String(n.to_string()),
        Token::Int(raw) => Value::String(I256::from_raw(*raw).to_string()),
        Token::Bool(b) => Value::Bool(*b),
        Token::String(s) => Value::String(s.clone()),
        Token::Bytes(b) | Token::FixedBytes(b) => Value::String(format!("0x{}", hex::encode(b))),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}

fn parse_param_type(raw: &str) -> std::result::Result<ParamType, String> {
    let normalized = match raw {
        "uint" => "uint256",
        "int" => "int256",
        other => other,
    };
    let param = Reader::read(normalized).map_err(|e| format!("invalid type '{}': {}", raw, e))?;
    check_widths(&param).map_err(|e| format!("invalid type '{}': {}", raw, e))?;
    Ok(param)
}

/// Integer widths must be multiples of 8 in 8..=256, fixed bytes 1..=32
fn check_widths(param: &ParamType) -> std::result::Result<(), String> {
    match param {
        ParamType::Int(bits) | ParamType::Uint(bits)
            if *bits == 0 || *bits > 256 || bits % 8 != 0 =>
        {
            Err(format!("unsupported integer width {}", bits))
        }
        ParamType::FixedBytes(len) if *len == 0 || *len > 32 => {
            Err(format!("unsupported fixed bytes length {}", len))
        }
        ParamType::Array(inner) | ParamType::FixedArray(inner, _) => check_widths(inner),
        ParamType::Tuple(components) => components.iter().try_for_each(check_widths),
        _ => Ok(()),
    }
}

/// Drop a trailing parameter name / data location (`address to`, `bytes memory data`)
fn strip_param_name(raw: &str) -> &str {
    let raw = raw.trim();
    if raw.starts_with('(') {
        return match matching_paren(raw, 0) {
            Some(close) => {
                let suffix_end = raw[close + 1..]
                    .find(char::is_whitespace)
                    .map(|i| close + 1 + i)
                    .unwrap_or(raw.len());
                &raw[..suffix_end]
            }
            None => raw,
        };
    }
    raw.split_whitespace().next().unwrap_or(raw)
}

fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn expect_str(value: &Value) -> std::result::Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected string, got {}", value))
}

fn expect_array(value: &Value) -> std::result::Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected array, got {}", value))
}

fn parse_hex(s: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| format!("invalid hex '{}': {}", s, e))
}

fn parse_uint(value: &Value) -> std::result::Result<U256, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("expected unsigned integer, got {}", n)),
        Value::String(s) => {
            let s = s.trim().replace('_', "");
            if let Some(hex_digits) = s.strip_prefix("0x") {
                U256::from_str_radix(hex_digits, 16).map_err(|e| format!("{}: {}", s, e))
            } else {
                U256::from_dec_str(&s).map_err(|e| format!("{}: {}", s, e))
            }
        }
        other => Err(format!("expected integer, got {}", other)),
    }
}

/// Sign and magnitude of a signed integer argument (decimal or `0x` hex)
fn parse_int(value: &Value) -> std::result::Result<(bool, U256), String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| (i < 0, U256::from(i.unsigned_abs())))
            .ok_or_else(|| format!("expected integer, got {}", n)),
        Value::String(s) => {
            let s = s.trim().replace('_', "");
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s.strip_prefix('+').unwrap_or(&s)),
            };
            let magnitude = match digits.strip_prefix("0x") {
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16).map_err(|e| format!("{}: {}", s, e)),
                None => U256::from_dec_str(digits).map_err(|e| format!("{}: {}", s, e)),
            }?;
            Ok((negative, magnitude))
        }
        other => Err(format!("expected integer, got {}", other)),
    }
}
