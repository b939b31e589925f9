//! Methods every channel exposes.

use chainbatch_core::{
    balance, parse_arg, require_sender, ContractConfig, ContractContext, ContractError,
    MethodInfo, MethodRegistry, RegistryError,
};
use chainbatch_mempool::NonceGuard;
use chainbatch_types::{Address, Amount, Asset, ChannelId, Hash, TxId};

/// Methods only the channel-transfer service may invoke.
pub const ROBOT_METHODS: &[&str] = &[
    "createCCTransferTo",
    "cancelCCTransferFrom",
    "commitCCTransferFrom",
    "deleteCCTransferFrom",
    "deleteCCTransferTo",
];

const TRANSFER_METHODS: &[&str] = &[
    "channelTransferByCustomer",
    "channelTransferByAdmin",
    "createCCTransferTo",
    "cancelCCTransferFrom",
    "commitCCTransferFrom",
    "deleteCCTransferFrom",
    "deleteCCTransferTo",
];

fn tx_id_arg(raw: &[String], index: usize) -> Result<TxId, ContractError> {
    let value = raw
        .get(index)
        .ok_or_else(|| ContractError::invalid_argument(format!("missing argument {index} (id)")))?;
    TxId::from_hex(value)
        .map_err(|e| ContractError::invalid_argument(format!("invalid argument id: {e}")))
}

fn string_arg(raw: &[String], index: usize) -> String {
    raw.get(index).cloned().unwrap_or_default()
}

fn json<T: serde::Serialize>(value: &T) -> Result<Option<String>, ContractError> {
    Ok(Some(serde_json::to_string(value)?))
}

/// Register the transfer, swap, nonce and balance methods.
///
/// Transfer methods are registered but disabled when channel transfers are
/// switched off in `config`.
pub fn register_base_methods(
    registry: &mut MethodRegistry,
    config: &ContractConfig,
) -> Result<(), RegistryError> {
    register_transfer_methods(registry)?;
    register_swap_methods(registry)?;
    register_queries(registry, config)?;

    registry.register(
        MethodInfo::tx("healthCheck", 0),
        |_: &[String]| Ok(()),
        |_: &mut ContractContext<'_>, sender: Option<&Address>, ()| {
            require_sender(sender)?;
            Ok(None)
        },
    )?;

    if config.disable_channel_transfers {
        for name in TRANSFER_METHODS {
            registry.disable(*name);
        }
    }
    Ok(())
}

fn register_transfer_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(
        MethodInfo::tx("channelTransferByCustomer", 4),
        |raw: &[String]| {
            Ok((
                string_arg(raw, 0),
                ChannelId::new(string_arg(raw, 1)),
                string_arg(raw, 2),
                parse_arg::<Amount>(raw, 3, "amount")?,
            ))
        },
        |ctx: &mut ContractContext<'_>,
         sender: Option<&Address>,
         (id, to, token, amount): (String, ChannelId, String, Amount)| {
            let sender = require_sender(sender)?;
            Ok(Some(chainbatch_transfer::channel_transfer_by_customer(
                ctx, sender, &id, &to, &token, amount,
            )?))
        },
    )?;
    registry.register(
        MethodInfo::tx("channelTransferByAdmin", 5),
        |raw: &[String]| {
            Ok((
                string_arg(raw, 0),
                ChannelId::new(string_arg(raw, 1)),
                parse_arg::<Address>(raw, 2, "user")?,
                string_arg(raw, 3),
                parse_arg::<Amount>(raw, 4, "amount")?,
            ))
        },
        |ctx: &mut ContractContext<'_>,
         sender: Option<&Address>,
         (id, to, user, token, amount): (String, ChannelId, Address, String, Amount)| {
            let sender = require_sender(sender)?;
            Ok(Some(chainbatch_transfer::channel_transfer_by_admin(
                ctx, sender, &id, &to, &user, &token, amount,
            )?))
        },
    )?;
    registry.register(
        MethodInfo::tx("createCCTransferTo", 1).with_auth(false),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, payload: String| {
            Ok(Some(chainbatch_transfer::create_to_from_payload(ctx, &payload)?))
        },
    )?;
    registry.register(
        MethodInfo::tx("cancelCCTransferFrom", 1).with_auth(false),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            chainbatch_transfer::cancel_from(ctx, &id)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::no_batch("commitCCTransferFrom", 1),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            chainbatch_transfer::commit_from(ctx, &id)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::no_batch("deleteCCTransferFrom", 1),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            chainbatch_transfer::delete_from(ctx, &id)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::no_batch("deleteCCTransferTo", 1),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            chainbatch_transfer::delete_to(ctx, &id)?;
            Ok(None)
        },
    )?;
    Ok(())
}

fn register_swap_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(
        MethodInfo::tx("swapBegin", 4),
        |raw: &[String]| {
            Ok((
                string_arg(raw, 0),
                ChannelId::new(string_arg(raw, 1)),
                parse_arg::<Amount>(raw, 2, "amount")?,
                parse_arg::<Hash>(raw, 3, "hash")?,
            ))
        },
        |ctx: &mut ContractContext<'_>,
         sender: Option<&Address>,
         (token, to, amount, hash): (String, ChannelId, Amount, Hash)| {
            let sender = require_sender(sender)?;
            Ok(Some(chainbatch_swap::swap_begin(
                ctx, sender, &token, &to, amount, hash,
            )?))
        },
    )?;
    registry.register(
        MethodInfo::tx("swapCancel", 1),
        |raw: &[String]| tx_id_arg(raw, 0),
        |ctx: &mut ContractContext<'_>, sender: Option<&Address>, id: TxId| {
            let sender = require_sender(sender)?;
            chainbatch_swap::swap_cancel(ctx, sender, &id)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::no_batch("swapDone", 2),
        |raw: &[String]| Ok((tx_id_arg(raw, 0)?, string_arg(raw, 1))),
        |ctx: &mut ContractContext<'_>, _, (id, key): (TxId, String)| {
            chainbatch_swap::swap_user_done(ctx, &id, &key)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::tx("multiSwapBegin", 4),
        |raw: &[String]| {
            let assets: Vec<Asset> = serde_json::from_str(&string_arg(raw, 1))
                .map_err(|e| ContractError::invalid_argument(format!("invalid argument assets: {e}")))?;
            Ok((
                string_arg(raw, 0),
                assets,
                ChannelId::new(string_arg(raw, 2)),
                parse_arg::<Hash>(raw, 3, "hash")?,
            ))
        },
        |ctx: &mut ContractContext<'_>,
         sender: Option<&Address>,
         (token, assets, to, hash): (String, Vec<Asset>, ChannelId, Hash)| {
            let sender = require_sender(sender)?;
            Ok(Some(chainbatch_swap::multi_swap_begin(
                ctx, sender, &token, assets, &to, hash,
            )?))
        },
    )?;
    registry.register(
        MethodInfo::tx("multiSwapCancel", 1),
        |raw: &[String]| tx_id_arg(raw, 0),
        |ctx: &mut ContractContext<'_>, sender: Option<&Address>, id: TxId| {
            let sender = require_sender(sender)?;
            chainbatch_swap::multi_swap_cancel(ctx, sender, &id)?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::no_batch("multiSwapDone", 2),
        |raw: &[String]| Ok((tx_id_arg(raw, 0)?, string_arg(raw, 1))),
        |ctx: &mut ContractContext<'_>, _, (id, key): (TxId, String)| {
            chainbatch_swap::multi_swap_user_done(ctx, &id, &key)?;
            Ok(None)
        },
    )?;
    Ok(())
}

fn register_queries(registry: &mut MethodRegistry, config: &ContractConfig) -> Result<(), RegistryError> {
    registry.register(
        MethodInfo::query("channelTransferFrom", 1),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            json(&chainbatch_transfer::query_from(ctx.state_ref(), &id)?)
        },
    )?;
    registry.register(
        MethodInfo::query("channelTransferTo", 1),
        |raw: &[String]| Ok(string_arg(raw, 0)),
        |ctx: &mut ContractContext<'_>, _, id: String| {
            json(&chainbatch_transfer::query_to(ctx.state_ref(), &id)?)
        },
    )?;
    registry.register(
        MethodInfo::query("channelTransfersFrom", 2),
        |raw: &[String]| Ok((parse_arg::<i64>(raw, 0, "page size")?, string_arg(raw, 1))),
        |ctx: &mut ContractContext<'_>, _, (page_size, bookmark): (i64, String)| {
            json(&chainbatch_transfer::query_from_page(
                ctx.state_ref(),
                page_size,
                &bookmark,
            )?)
        },
    )?;
    registry.register(
        MethodInfo::query("swapGet", 1),
        |raw: &[String]| tx_id_arg(raw, 0),
        |ctx: &mut ContractContext<'_>, _, id: TxId| {
            json(&chainbatch_swap::swap_get(ctx.state_ref(), &id)?)
        },
    )?;
    registry.register(
        MethodInfo::query("multiSwapGet", 1),
        |raw: &[String]| tx_id_arg(raw, 0),
        |ctx: &mut ContractContext<'_>, _, id: TxId| {
            json(&chainbatch_swap::multi_swap_get(ctx.state_ref(), &id)?)
        },
    )?;

    let guard = NonceGuard::from_config(config);
    registry.register(
        MethodInfo::query("getNonce", 1),
        |raw: &[String]| parse_arg::<Address>(raw, 0, "address"),
        move |ctx: &mut ContractContext<'_>, _, address: Address| {
            Ok(Some(guard.query(ctx.state_ref(), &address)?))
        },
    )?;
    registry.register(
        MethodInfo::query("balanceOf", 2),
        |raw: &[String]| Ok((string_arg(raw, 0), parse_arg::<Address>(raw, 1, "address")?)),
        |ctx: &mut ContractContext<'_>, _, (token, address): (String, Address)| {
            Ok(Some(ctx.token_balance(&token, &address)?.to_string()))
        },
    )?;
    registry.register(
        MethodInfo::query("allowedBalanceOf", 2),
        |raw: &[String]| Ok((string_arg(raw, 0), parse_arg::<Address>(raw, 1, "address")?)),
        |ctx: &mut ContractContext<'_>, _, (token, address): (String, Address)| {
            Ok(Some(ctx.allowed_balance(&token, &address)?.to_string()))
        },
    )?;
    registry.register(
        MethodInfo::query("givenBalance", 1),
        |raw: &[String]| Ok(ChannelId::new(string_arg(raw, 0))),
        |ctx: &mut ContractContext<'_>, _, channel: ChannelId| {
            Ok(Some(balance::given_balance(ctx.state_ref(), &channel)?.to_string()))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_methods_register_once() {
        let config = ContractConfig::for_channel("CC");
        let mut registry = MethodRegistry::new();
        register_base_methods(&mut registry, &config).unwrap();
        assert!(registry.resolve("swapBegin").is_some());
        assert!(registry.resolve("channelTransfersFrom").is_some());
        assert_eq!(
            register_base_methods(&mut registry, &config),
            Err(RegistryError::Duplicate("channelTransferByCustomer".into()))
        );
    }

    #[test]
    fn test_transfers_disabled() {
        let config = ContractConfig::for_channel("CC").with_channel_transfers_disabled();
        let mut registry = MethodRegistry::new();
        register_base_methods(&mut registry, &config).unwrap();
        for name in TRANSFER_METHODS {
            assert!(registry.resolve(name).is_none());
        }
        assert!(registry.resolve("swapBegin").is_some());
    }

    #[test]
    fn test_id_argument_must_be_hex() {
        let err = tx_id_arg(&["zz".to_string()], 0).unwrap_err();
        assert!(err.to_string().starts_with("invalid argument id"));
        assert_eq!(tx_id_arg(&["0a".to_string()], 0).unwrap(), TxId(vec![0x0a]));
    }
}
