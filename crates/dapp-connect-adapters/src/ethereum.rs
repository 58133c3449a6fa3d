//! EVM request shaping before calls reach the wallet client.

use alloy::primitives::Address;
use serde_json::Value;

use dapp_connect_core::methods::{
    ETH_SIGN_TYPED_DATA_V4, PERSONAL_SIGN, WALLET_ADD_ETHEREUM_CHAIN,
    WALLET_SWITCH_ETHEREUM_CHAIN,
};
use dapp_connect_core::{ConnectError, RequestArguments};

/// Validates and normalizes the params of structured EVM methods. Other
/// methods pass through untouched.
pub fn prepare_request(args: RequestArguments) -> Result<RequestArguments, ConnectError> {
    match args.method.as_str() {
        PERSONAL_SIGN => {
            let params = args.positional();
            if params.len() < 2 {
                return Err(ConnectError::InvalidParams(
                    "personal_sign expects [message, address]".to_owned(),
                ));
            }
            let message = params[0].as_str().ok_or_else(|| {
                ConnectError::InvalidParams("personal_sign message must be a string".to_owned())
            })?;
            let address = param_address(&params[1], PERSONAL_SIGN)?;
            let message = if is_hex_prefixed(message) {
                message.to_owned()
            } else {
                string_to_hex(message)
            };
            Ok(RequestArguments::with_params(
                PERSONAL_SIGN,
                serde_json::json!([message, address]),
            ))
        }
        ETH_SIGN_TYPED_DATA_V4 => {
            let params = args.positional();
            if params.len() < 2 {
                return Err(ConnectError::InvalidParams(
                    "eth_signTypedData_v4 expects [address, typedData]".to_owned(),
                ));
            }
            let address = param_address(&params[0], ETH_SIGN_TYPED_DATA_V4)?;
            let typed_data = match &params[1] {
                Value::String(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
                    ConnectError::InvalidParams(format!("typed data is not valid JSON: {e}"))
                })?,
                obj @ Value::Object(_) => obj.clone(),
                _ => {
                    return Err(ConnectError::InvalidParams(
                        "typed data must be a JSON string or object".to_owned(),
                    ))
                }
            };
            if !typed_data.is_object() {
                return Err(ConnectError::InvalidParams(
                    "typed data must decode to an object".to_owned(),
                ));
            }
            Ok(RequestArguments::with_params(
                ETH_SIGN_TYPED_DATA_V4,
                serde_json::json!([address, typed_data]),
            ))
        }
        WALLET_SWITCH_ETHEREUM_CHAIN | WALLET_ADD_ETHEREUM_CHAIN => {
            let raw = args
                .positional()
                .first()
                .and_then(|p| p.get("chainId"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ConnectError::InvalidParams(format!("{} expects [{{chainId}}]", args.method))
                })?;
            parse_chain_id(raw)?;
            Ok(args)
        }
        _ => Ok(args),
    }
}

fn param_address(value: &Value, method: &str) -> Result<String, ConnectError> {
    let raw = value.as_str().ok_or_else(|| {
        ConnectError::InvalidParams(format!("{method} address must be a string"))
    })?;
    raw.parse::<Address>()
        .map_err(|e| ConnectError::InvalidParams(format!("{method} invalid address {raw}: {e}")))?;
    Ok(raw.to_owned())
}

fn is_hex_prefixed(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub fn string_to_hex(raw: &str) -> String {
    format!("0x{}", alloy::hex::encode(raw.as_bytes()))
}

/// Accepts `0x`-prefixed hex or decimal chain ids.
pub fn parse_chain_id(raw: &str) -> Result<u64, ConnectError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| ConnectError::InvalidParams(format!("invalid hex chain id {raw}: {e}")))
    } else {
        raw.parse()
            .map_err(|e| ConnectError::InvalidParams(format!("invalid chain id {raw}: {e}")))
    }
}

pub fn chain_id_to_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}
