// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conversion between the JSON values scenarios work with and ABI tokens.
//!
//! Arguments are written as a JSON array and converted using the parameter
//! types of the called method. Results come back the way a JS web3 client
//! would present them: integers as decimal strings, addresses as hex strings,
//! so expectations can be written as plain strings.

use crate::error::{ClientError, ClientResult};
use crate::types::{address_hex, ContractDescriptor, EventFields};
use ethers::abi::{Event, Function, ParamType, RawLog, Token};
use ethers::types::{Address as EthAddress, Log, I256, U256};
use serde_json::Value;
use std::str::FromStr;

pub fn encode_call(function: &Function, args: &Value) -> ClientResult<Vec<u8>> {
    let tokens = tokenize_args(function, args)?;
    Ok(function.encode_input(&tokens)?)
}

pub fn tokenize_args(function: &Function, args: &Value) -> ClientResult<Vec<Token>> {
    let mismatch = |reason: String| ClientError::ArgumentMismatch {
        method: function.name.clone(),
        reason,
    };
    let values: &[Value] = match args {
        Value::Array(values) => values.as_slice(),
        Value::Null => &[],
        other => return Err(mismatch(format!("expected an array of arguments, got {}", other))),
    };
    if values.len() != function.inputs.len() {
        return Err(mismatch(format!(
            "expected {} arguments, got {}",
            function.inputs.len(),
            values.len()
        )));
    }
    function
        .inputs
        .iter()
        .zip(values)
        .map(|(param, value)| {
            tokenize(&param.kind, value)
                .map_err(|reason| mismatch(format!("parameter `{}`: {}", param.name, reason)))
        })
        .collect()
}

fn tokenize(kind: &ParamType, value: &Value) -> Result<Token, String> {
    match kind {
        ParamType::Address => {
            let s = expect_str(value)?;
            EthAddress::from_str(s.trim())
                .map(Token::Address)
                .map_err(|_| format!("{:?} is not an address", s))
        }
        ParamType::Uint(size) => {
            let n = parse_uint(value)?;
            if n.bits() > *size {
                return Err(format!("{} does not fit in uint{}", n, size));
            }
            Ok(Token::Uint(n))
        }
        ParamType::Int(size) => {
            let i = parse_int(value)?;
            if !fits_signed(i, *size) {
                return Err(format!("{} does not fit in int{}", i, size));
            }
            Ok(Token::Int(i.into_raw()))
        }
        ParamType::Bool => value
            .as_bool()
            .map(Token::Bool)
            .ok_or_else(|| format!("expected a boolean, got {}", value)),
        ParamType::String => expect_str(value).map(|s| Token::String(s.to_string())),
        ParamType::Bytes => decode_hex(value).map(Token::Bytes),
        ParamType::FixedBytes(len) => {
            let bytes = decode_hex(value)?;
            if bytes.len() != *len {
                return Err(format!("expected {} bytes, got {}", len, bytes.len()));
            }
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Array(inner) => expect_array(value)?
            .iter()
            .map(|v| tokenize(inner, v))
            .collect::<Result<_, _>>()
            .map(Token::Array),
        ParamType::FixedArray(inner, len) => {
            let values = expect_array(value)?;
            if values.len() != *len {
                return Err(format!("expected {} elements, got {}", len, values.len()));
            }
            values
                .iter()
                .map(|v| tokenize(inner, v))
                .collect::<Result<_, _>>()
                .map(Token::FixedArray)
        }
        ParamType::Tuple(kinds) => {
            let values = expect_array(value)?;
            if values.len() != kinds.len() {
                return Err(format!(
                    "expected a tuple of {} elements, got {}",
                    kinds.len(),
                    values.len()
                ));
            }
            kinds
                .iter()
                .zip(values)
                .map(|(kind, v)| tokenize(kind, v))
                .collect::<Result<_, _>>()
                .map(Token::Tuple)
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {}", value))
}

fn expect_array(value: &Value) -> Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", value))
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

// int<size> holds -2^(size-1) ..= 2^(size-1) - 1.
fn fits_signed(i: I256, size: usize) -> bool {
    let magnitude = i.unsigned_abs();
    if i.is_negative() {
        (magnitude - 1).bits() < size
    } else {
        magnitude.bits() < size
    }
}

fn parse_uint(value: &Value) -> Result<U256, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("{} is not an unsigned integer", n)),
        Value::String(s) => match strip_hex_prefix(s) {
            Some(digits) => U256::from_str_radix(digits, 16).map_err(|e| format!("{:?}: {}", s, e)),
            None => U256::from_dec_str(s).map_err(|e| format!("{:?}: {}", s, e)),
        },
        other => Err(format!("expected an unsigned integer, got {}", other)),
    }
}

fn parse_int(value: &Value) -> Result<I256, String> {
    let text = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(format!("expected an integer, got {}", other)),
    };
    I256::from_dec_str(&text).map_err(|e| format!("{:?}: {}", text, e))
}

fn decode_hex(value: &Value) -> Result<Vec<u8>, String> {
    let s = expect_str(value)?;
    hex::decode(strip_hex_prefix(s).unwrap_or(s)).map_err(|e| format!("{:?}: {}", s, e))
}

pub fn token_to_value(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(address_hex(&address)),
        Token::Uint(n) => Value::String(n.to_string()),
        Token::Int(n) => Value::String(I256::from_raw(n).to_string()),
        Token::Bool(b) => Value::Bool(b),
        Token::String(s) => Value::String(s),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Array(tokens) | Token::FixedArray(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_value).collect())
        }
    }
}

// A single output is returned bare, several outputs as an array in
// declaration order.
pub fn decode_output(function: &Function, output: &[u8]) -> ClientResult<Value> {
    let mut tokens = function.decode_output(output)?;
    if tokens.len() == 1 {
        Ok(token_to_value(tokens.remove(0)))
    } else {
        Ok(Value::Array(tokens.into_iter().map(token_to_value).collect()))
    }
}

/// Decode the first log in `logs` carrying `event`'s signature. Logs are
/// matched by topic like a web3 receipt, so events emitted by contracts
/// called along the way are found too; `contract`'s own logs are tried
/// first. A matching log that does not decode is skipped, and its error is
/// returned only if no other log decodes.
pub fn decode_event(
    contract: &ContractDescriptor,
    event: &Event,
    logs: &[Log],
) -> ClientResult<Option<EventFields>> {
    let signature = event.signature();
    let (own, foreign): (Vec<&Log>, Vec<&Log>) = logs
        .iter()
        .filter(|log| log.topics.first() == Some(&signature))
        .partition(|log| log.address == contract.address);

    let mut last_error = None;
    for log in own.into_iter().chain(foreign) {
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        match event.parse_log(raw) {
            Ok(parsed) => {
                return Ok(Some(
                    parsed
                        .params
                        .into_iter()
                        .map(|param| (param.name, token_to_value(param.value)))
                        .collect(),
                ))
            }
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) => Err(e.into()),
        None => Ok(None),
    }
}
