//! Transfer state transitions.

use crate::{storage, TransferError};
use chainbatch_core::ContractContext;
use chainbatch_types::{token_symbol, Address, Amount, ChannelId, CrossChannelTransfer};
use tracing::debug;

const REASON: &str = "ch-transfer";
const CANCEL_REASON: &str = "cancel ch-transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    CreateFrom,
    CreateTo,
    CancelFrom,
}

/// Start a transfer of the sender's own tokens to `to`.
///
/// Returns the id of the transaction that created the record.
pub fn channel_transfer_by_customer(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    id: &str,
    to: &ChannelId,
    token: &str,
    amount: Amount,
) -> Result<String, TransferError> {
    create_from(ctx, id, to, sender, token, amount)
}

/// Start a transfer of `user`'s tokens, signed by the channel admin.
pub fn channel_transfer_by_admin(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    id: &str,
    to: &ChannelId,
    user: &Address,
    token: &str,
    amount: Amount,
) -> Result<String, TransferError> {
    let admin = ctx.config().admin.ok_or(TransferError::AdminKeyNotFound)?;
    if *sender != admin {
        return Err(TransferError::AdminKeyNotFound);
    }
    if sender == user {
        return Err(TransferError::InvalidUser);
    }
    create_from(ctx, id, to, user, token, amount)
}

fn create_from(
    ctx: &mut ContractContext<'_>,
    id: &str,
    to: &ChannelId,
    user: &Address,
    token: &str,
    amount: Amount,
) -> Result<String, TransferError> {
    let channel = ctx.channel();
    if channel == to {
        return Err(TransferError::InvalidChannel);
    }
    let symbol = token_symbol(token);
    if !channel.is(symbol) && !to.is(symbol) {
        return Err(TransferError::InvalidToken);
    }
    if storage::exists_from(ctx.state_ref(), id)? {
        return Err(TransferError::AlreadyExists);
    }

    let transfer = CrossChannelTransfer {
        id: id.to_string(),
        from: channel.clone(),
        to: to.clone(),
        token: token.to_string(),
        user: *user,
        amount,
        forward_direction: channel.is(symbol),
        time_as_nanos: ctx.timestamp()?.as_nanos(),
        is_commit: false,
    };
    storage::save_from(ctx.state(), &transfer)?;
    change_balance(ctx, Operation::CreateFrom, &transfer)?;

    debug!(
        id,
        to = %to,
        token,
        forward = transfer.forward_direction,
        "Transfer created on origin"
    );
    Ok(ctx.tx_id().to_hex())
}

/// Mirror a transfer on the destination channel, already committed.
pub fn create_to(
    ctx: &mut ContractContext<'_>,
    mut transfer: CrossChannelTransfer,
) -> Result<String, TransferError> {
    if storage::exists_to(ctx.state_ref(), &transfer.id)? {
        return Err(TransferError::AlreadyExists);
    }
    let channel = ctx.channel();
    if *channel != transfer.from && *channel != transfer.to {
        return Err(TransferError::InvalidChannel);
    }
    if transfer.from == transfer.to {
        return Err(TransferError::InvalidChannel);
    }
    let symbol = transfer.token_symbol();
    if !transfer.from.is(symbol) && !transfer.to.is(symbol) {
        return Err(TransferError::InvalidToken);
    }
    if transfer.from.is(symbol) != transfer.forward_direction {
        return Err(TransferError::InvalidToken);
    }

    transfer.is_commit = true;
    storage::save_to(ctx.state(), &transfer)?;
    change_balance(ctx, Operation::CreateTo, &transfer)?;

    debug!(id = %transfer.id, from = %transfer.from, "Transfer created on destination");
    Ok(ctx.tx_id().to_hex())
}

/// [`create_to`] from a JSON-encoded record.
pub fn create_to_from_payload(
    ctx: &mut ContractContext<'_>,
    data: &str,
) -> Result<String, TransferError> {
    let transfer: CrossChannelTransfer =
        serde_json::from_str(data).map_err(|e| TransferError::InvalidPayload(e.to_string()))?;
    create_to(ctx, transfer)
}

/// Mark the origin record committed.
pub fn commit_from(ctx: &mut ContractContext<'_>, id: &str) -> Result<(), TransferError> {
    let mut transfer = storage::load_from(ctx.state_ref(), id)?;
    if transfer.is_commit {
        return Err(TransferError::AlreadyCommitted);
    }
    transfer.is_commit = true;
    storage::save_from(ctx.state(), &transfer)?;
    debug!(id, "Transfer committed on origin");
    Ok(())
}

/// Refund an uncommitted origin record and delete it.
pub fn cancel_from(ctx: &mut ContractContext<'_>, id: &str) -> Result<(), TransferError> {
    let transfer = storage::load_from(ctx.state_ref(), id)?;
    if transfer.is_commit {
        return Err(TransferError::AlreadyCommitted);
    }
    change_balance(ctx, Operation::CancelFrom, &transfer)?;
    storage::delete_from(ctx.state(), id)?;
    debug!(id, "Transfer cancelled on origin");
    Ok(())
}

/// Delete a committed origin record.
pub fn delete_from(ctx: &mut ContractContext<'_>, id: &str) -> Result<(), TransferError> {
    let transfer = storage::load_from(ctx.state_ref(), id)?;
    if !transfer.is_commit {
        return Err(TransferError::NotCommitted);
    }
    storage::delete_from(ctx.state(), id)
}

/// Delete a committed destination record.
pub fn delete_to(ctx: &mut ContractContext<'_>, id: &str) -> Result<(), TransferError> {
    let transfer = storage::load_to(ctx.state_ref(), id)?;
    if !transfer.is_commit {
        return Err(TransferError::NotCommitted);
    }
    storage::delete_to(ctx.state(), id)
}

fn change_balance(
    ctx: &mut ContractContext<'_>,
    operation: Operation,
    t: &CrossChannelTransfer,
) -> Result<(), TransferError> {
    match (operation, t.forward_direction) {
        (Operation::CreateFrom, true) => {
            ctx.token_balance_sub(&t.token, &t.user, t.amount, REASON)?;
            ctx.given_balance_add(&t.to, t.amount)?;
        }
        (Operation::CreateFrom, false) => {
            ctx.allowed_balance_sub(&t.token, &t.user, t.amount, REASON)?;
        }
        (Operation::CreateTo, true) => {
            ctx.allowed_balance_add(&t.token, &t.user, t.amount, REASON)?;
        }
        (Operation::CreateTo, false) => {
            ctx.token_balance_add(&t.token, &t.user, t.amount, REASON)?;
            ctx.given_balance_sub(&t.from, t.amount)?;
        }
        (Operation::CancelFrom, true) => {
            ctx.token_balance_add(&t.token, &t.user, t.amount, CANCEL_REASON)?;
            ctx.given_balance_sub(&t.to, t.amount)?;
        }
        (Operation::CancelFrom, false) => {
            ctx.allowed_balance_add(&t.token, &t.user, t.amount, CANCEL_REASON)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query_from, query_to};
    use chainbatch_core::{ContractConfig, ContractError, ErrorKind, MemoryLedger, TxTimestamp};
    use chainbatch_types::TxId;

    const USER: Address = Address([1; 32]);
    const ADMIN: Address = Address([9; 32]);

    struct Channel {
        config: ContractConfig,
        ledger: MemoryLedger,
    }

    impl Channel {
        fn new(id: &str) -> Self {
            let mut ledger = MemoryLedger::new();
            ledger.begin_tx(TxId(vec![0x01]), TxTimestamp::new(1_000, 5), vec![]);
            Self {
                config: ContractConfig::for_channel(id).with_admin(ADMIN),
                ledger,
            }
        }

        fn run<T>(&mut self, f: impl FnOnce(&mut ContractContext<'_>) -> T) -> T {
            let mut ctx = ContractContext::new(&mut self.ledger, &self.config);
            f(&mut ctx)
        }

        fn own(&mut self, token: &str) -> u128 {
            self.run(|ctx| ctx.token_balance(token, &USER).unwrap().get())
        }

        fn allowed(&mut self, token: &str) -> u128 {
            self.run(|ctx| ctx.allowed_balance(token, &USER).unwrap().get())
        }

        fn given(&mut self, channel: &str) -> u128 {
            self.run(|ctx| ctx.given_balance(&ChannelId::new(channel)).unwrap().get())
        }
    }

    fn funded_vt() -> Channel {
        let mut vt = Channel::new("VT");
        vt.run(|ctx| {
            ctx.token_balance_add("VT", &USER, Amount::new(100), "emit")
                .unwrap()
        });
        vt
    }

    #[test]
    fn test_forward_round_trip() {
        let mut vt = funded_vt();
        let mut cc = Channel::new("CC");
        let to = ChannelId::new("CC");

        let tx = vt
            .run(|ctx| channel_transfer_by_customer(ctx, &USER, "t1", &to, "VT", Amount::new(40)))
            .unwrap();
        assert_eq!(tx, "01");
        assert_eq!(vt.own("VT"), 60);
        assert_eq!(vt.given("CC"), 40);

        let record = query_from(&vt.ledger, "t1").unwrap();
        assert!(record.forward_direction);
        assert!(!record.is_commit);
        assert_eq!(record.time_as_nanos, 1_000_000_000_005);

        cc.run(|ctx| create_to(ctx, record.clone())).unwrap();
        assert_eq!(cc.allowed("VT"), 40);
        assert!(query_to(&cc.ledger, "t1").unwrap().is_commit);

        vt.run(|ctx| commit_from(ctx, "t1")).unwrap();
        cc.run(|ctx| delete_to(ctx, "t1")).unwrap();
        vt.run(|ctx| delete_from(ctx, "t1")).unwrap();

        assert_eq!(query_from(&vt.ledger, "t1"), Err(TransferError::NotFound));
        assert_eq!(query_to(&cc.ledger, "t1"), Err(TransferError::NotFound));
        assert_eq!(vt.own("VT"), 60);
        assert_eq!(vt.given("CC"), 40);
        assert_eq!(cc.allowed("VT"), 40);
    }

    #[test]
    fn test_reverse_round_trip() {
        let mut vt = funded_vt();
        let mut cc = Channel::new("CC");
        cc.run(|ctx| ctx.allowed_balance_add("VT", &USER, Amount::new(30), "in"))
            .unwrap();
        vt.run(|ctx| ctx.given_balance_add(&ChannelId::new("CC"), Amount::new(30)))
            .unwrap();
        let back = ChannelId::new("VT");

        cc.run(|ctx| channel_transfer_by_customer(ctx, &USER, "r1", &back, "VT", Amount::new(30)))
            .unwrap();
        assert_eq!(cc.allowed("VT"), 0);

        let record = query_from(&cc.ledger, "r1").unwrap();
        assert!(!record.forward_direction);

        vt.run(|ctx| create_to(ctx, record)).unwrap();
        assert_eq!(vt.own("VT"), 130);
        assert_eq!(vt.given("CC"), 0);
    }

    #[test]
    fn test_cancel_refunds() {
        let mut vt = funded_vt();
        let to = ChannelId::new("CC");
        vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t1", &to, "VT", Amount::new(40)))
            .unwrap();

        vt.run(|ctx| cancel_from(ctx, "t1")).unwrap();
        assert_eq!(vt.own("VT"), 100);
        assert_eq!(vt.given("CC"), 0);
        assert_eq!(query_from(&vt.ledger, "t1"), Err(TransferError::NotFound));
    }

    #[test]
    fn test_cancel_after_commit_fails_without_balance_change() {
        let mut vt = funded_vt();
        let to = ChannelId::new("CC");
        vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t1", &to, "VT", Amount::new(40)))
            .unwrap();
        vt.run(|ctx| commit_from(ctx, "t1")).unwrap();

        let err = vt.run(|ctx| cancel_from(ctx, "t1")).unwrap_err();
        assert_eq!(err, TransferError::AlreadyCommitted);
        assert_eq!(ContractError::from(err).kind(), ErrorKind::AlreadyCommitted);
        assert_eq!(vt.own("VT"), 60);
        assert_eq!(vt.given("CC"), 40);

        assert_eq!(
            vt.run(|ctx| commit_from(ctx, "t1")),
            Err(TransferError::AlreadyCommitted)
        );
    }

    #[test]
    fn test_create_from_guards() {
        let mut vt = funded_vt();
        let vt_id = ChannelId::new("VT");
        let cc = ChannelId::new("CC");

        assert_eq!(
            vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t", &vt_id, "VT", Amount::new(1))),
            Err(TransferError::InvalidChannel)
        );
        assert_eq!(
            vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t", &cc, "FIAT", Amount::new(1))),
            Err(TransferError::InvalidToken)
        );
        vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t", &cc, "VT", Amount::new(1)))
            .unwrap();
        assert_eq!(
            vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t", &cc, "VT", Amount::new(1))),
            Err(TransferError::AlreadyExists)
        );

        let err = vt
            .run(|ctx| channel_transfer_by_customer(ctx, &USER, "big", &cc, "VT", Amount::new(1_000)))
            .unwrap_err();
        assert_eq!(ContractError::from(err).kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_create_to_guards() {
        let mut cc = Channel::new("CC");
        let base = CrossChannelTransfer {
            id: "t1".into(),
            from: ChannelId::new("VT"),
            to: ChannelId::new("CC"),
            token: "VT".into(),
            user: USER,
            amount: Amount::new(5),
            forward_direction: true,
            time_as_nanos: 0,
            is_commit: false,
        };

        let wrong_dir = CrossChannelTransfer {
            forward_direction: false,
            ..base.clone()
        };
        assert_eq!(cc.run(|ctx| create_to(ctx, wrong_dir)), Err(TransferError::InvalidToken));

        let foreign = CrossChannelTransfer {
            from: ChannelId::new("AA"),
            to: ChannelId::new("BB"),
            ..base.clone()
        };
        assert_eq!(cc.run(|ctx| create_to(ctx, foreign)), Err(TransferError::InvalidChannel));

        let same = CrossChannelTransfer {
            from: ChannelId::new("CC"),
            ..base.clone()
        };
        assert_eq!(cc.run(|ctx| create_to(ctx, same)), Err(TransferError::InvalidChannel));

        let bad_token = CrossChannelTransfer {
            token: "FIAT".into(),
            ..base.clone()
        };
        assert_eq!(cc.run(|ctx| create_to(ctx, bad_token)), Err(TransferError::InvalidToken));

        cc.run(|ctx| create_to(ctx, base.clone())).unwrap();
        assert_eq!(cc.run(|ctx| create_to(ctx, base)), Err(TransferError::AlreadyExists));

        assert!(matches!(
            cc.run(|ctx| create_to_from_payload(ctx, "{not json")),
            Err(TransferError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_delete_requires_commit() {
        let mut vt = funded_vt();
        let cc = ChannelId::new("CC");
        vt.run(|ctx| channel_transfer_by_customer(ctx, &USER, "t1", &cc, "VT", Amount::new(1)))
            .unwrap();
        assert_eq!(vt.run(|ctx| delete_from(ctx, "t1")), Err(TransferError::NotCommitted));
        assert_eq!(vt.run(|ctx| delete_to(ctx, "t1")), Err(TransferError::NotFound));
    }

    #[test]
    fn test_admin_transfer() {
        let mut vt = funded_vt();
        let cc = ChannelId::new("CC");
        let stranger = Address([3; 32]);

        assert_eq!(
            vt.run(|ctx| channel_transfer_by_admin(ctx, &stranger, "a", &cc, &USER, "VT", Amount::new(1))),
            Err(TransferError::AdminKeyNotFound)
        );
        assert_eq!(
            vt.run(|ctx| channel_transfer_by_admin(ctx, &ADMIN, "a", &cc, &ADMIN, "VT", Amount::new(1))),
            Err(TransferError::InvalidUser)
        );
        vt.run(|ctx| channel_transfer_by_admin(ctx, &ADMIN, "a", &cc, &USER, "VT", Amount::new(10)))
            .unwrap();
        assert_eq!(vt.own("VT"), 90);
        assert_eq!(query_from(&vt.ledger, "a").unwrap().user, USER);
    }

    #[test]
    fn test_admin_transfer_without_admin() {
        let mut vt = funded_vt();
        vt.config.admin = None;
        let cc = ChannelId::new("CC");
        assert_eq!(
            vt.run(|ctx| channel_transfer_by_admin(ctx, &ADMIN, "a", &cc, &USER, "VT", Amount::new(1))),
            Err(TransferError::AdminKeyNotFound)
        );
    }
}
