//! End-to-end scenarios across two channels, `VT` and `CC`.

use chainbatch_core::{ContractConfig, MethodRegistry};
use chainbatch_node::{Chaincode, Invocation, Response, BATCH_EXECUTE};
use chainbatch_test_helpers::{
    demo_registry, test_address, TestChannel, ROBOT_IDENTITY,
};
use chainbatch_types::{
    Address, Amount, Batch, BatchResponse, ChannelId, CrossChannelTransfer, Hash, SwapKey, TxId,
};
use tracing_test::traced_test;

const KEY: &str = "open sesame";

struct Channel {
    net: TestChannel,
    cc: Chaincode,
}

impl Channel {
    fn new(name: &str) -> Self {
        Self::with_registry(name, MethodRegistry::new())
    }

    fn with_registry(name: &str, registry: MethodRegistry) -> Self {
        let config = ContractConfig::for_channel(name)
            .with_admin(test_address(99))
            .with_robot_ski(Hash::digest(ROBOT_IDENTITY).as_bytes().to_vec());
        let cc = Chaincode::new(config.clone(), registry).unwrap();
        Self {
            net: TestChannel::with_config(config),
            cc,
        }
    }

    fn invoke(&mut self, invocation: Invocation) -> Response {
        self.net.next_tx();
        self.cc.invoke(&mut self.net.ledger, &invocation)
    }

    fn robot_invoke(&mut self, invocation: Invocation) -> Response {
        self.net.next_robot_tx();
        self.cc.invoke(&mut self.net.ledger, &invocation)
    }

    fn query(&mut self, function: &str, args: &[&str]) -> String {
        let response = self.invoke(Invocation::new(function).with_args(args.iter().copied()));
        String::from_utf8(response.payload().expect("query succeeds").to_vec()).unwrap()
    }

    /// Submit a batched call and return its pending id.
    fn submit(&mut self, sender: Address, nonce: u64, function: &str, args: &[&str]) -> TxId {
        let response = self.invoke(
            Invocation::new(function)
                .with_args(args.iter().copied())
                .signed_by(sender, nonce),
        );
        let hex = String::from_utf8(response.payload().expect("submitted").to_vec()).unwrap();
        TxId::from_hex(&hex).unwrap()
    }

    fn execute(&mut self, batch: &Batch) -> BatchResponse {
        let payload = serde_json::to_string(batch).unwrap();
        let response = self.robot_invoke(Invocation::new(BATCH_EXECUTE).with_args([payload]));
        match response {
            Response::Success(raw) => serde_json::from_slice(&raw).unwrap(),
            Response::Error(e) => panic!("batch failed: {e}"),
        }
    }

    fn execute_ids(&mut self, tx_ids: Vec<TxId>) -> BatchResponse {
        self.execute(&Batch {
            tx_ids,
            ..Default::default()
        })
    }
}

#[test]
fn test_batch_execute_requires_service_identity() {
    let mut vt = Channel::new("VT");
    let response = vt.invoke(Invocation::new(BATCH_EXECUTE).with_args(["{}"]));
    assert_eq!(
        response.error(),
        Some("unauthorized: caller is not the channel-transfer service")
    );

    let response = vt.invoke(Invocation::new("commitCCTransferFrom").with_args(["t1"]));
    assert!(!response.is_success());
}

#[test]
fn test_unknown_and_disabled_methods() {
    let mut vt = Channel::new("VT");
    assert_eq!(
        vt.invoke(Invocation::new("nope")).error(),
        Some("method 'nope' not found")
    );

    let config = ContractConfig::for_channel("VT").with_disabled_function("swapBegin");
    let cc = Chaincode::new(config, MethodRegistry::new()).unwrap();
    let mut net = TestChannel::new("VT");
    let response = cc.invoke(
        &mut net.ledger,
        &Invocation::new("swapBegin")
            .with_args(["VT", "CC", "1", Hash::digest(b"k").to_hex().as_str()])
            .signed_by(test_address(1), 1),
    );
    assert_eq!(response.error(), Some("method 'swapBegin' not found"));
}

#[test]
fn test_submit_rejects_replayed_nonce() {
    let mut vt = Channel::with_registry("VT", demo_registry());
    let alice = test_address(1);

    let results: Vec<bool> = [5u64, 7, 6]
        .iter()
        .map(|&nonce| {
            vt.invoke(
                Invocation::new("put")
                    .with_args(["k", "v"])
                    .signed_by(alice, nonce),
            )
            .is_success()
        })
        .collect();
    assert_eq!(results, vec![true, true, false]);
    assert_eq!(vt.query("getNonce", &[&alice.to_hex()]), "7");
}

#[test]
fn test_failed_submit_leaves_no_nonce() {
    let mut vt = Channel::with_registry("VT", demo_registry());
    let alice = test_address(1);
    let response = vt.invoke(
        Invocation::new("transfer")
            .with_args(["not-an-address", "VT", "1"])
            .signed_by(alice, 10),
    );
    assert!(!response.is_success());
    assert_eq!(vt.query("getNonce", &[&alice.to_hex()]), "0");
}

#[test]
fn test_queries_cannot_write() {
    let mut vt = Channel::new("VT");
    let alice = test_address(1);
    vt.net.fund("VT", &alice, 3);
    assert_eq!(vt.query("balanceOf", &["VT", &alice.to_hex()]), "3");
    assert_eq!(vt.query("allowedBalanceOf", &["VT", &alice.to_hex()]), "0");
    assert_eq!(vt.query("givenBalance", &["CC"]), "0");
}

#[traced_test]
#[test]
fn test_cross_channel_transfer_round_trip() {
    let mut vt = Channel::new("VT");
    let mut cc = Channel::new("CC");
    let alice = test_address(1);
    vt.net.fund("VT", &alice, 10);

    // Origin: the user's batched call debits them and records the transfer.
    let tx = vt.submit(alice, 1, "channelTransferByCustomer", &["t1", "CC", "VT", "4"]);
    let response = vt.execute_ids(vec![tx]);
    assert!(response.tx_responses[0].is_success());
    assert_eq!(vt.net.balance("VT", &alice), Amount::new(6));
    assert_eq!(vt.query("givenBalance", &["CC"]), "4");

    // Destination: the service mirrors the record through a batch command.
    let record: CrossChannelTransfer =
        serde_json::from_str(&vt.query("channelTransferFrom", &["t1"])).unwrap();
    assert!(!record.is_commit);
    let response = cc.execute(&Batch {
        transfer_commands: vec![chainbatch_types::TransferCommand::CreateTo {
            transfer: record.clone(),
        }],
        ..Default::default()
    });
    assert!(response.transfer_responses[0].error.is_none());
    assert_eq!(cc.net.allowed_balance("VT", &alice), Amount::new(4));

    // Replaying the destination side is rejected and changes nothing.
    let payload = serde_json::to_string(&record).unwrap();
    let replay = cc.robot_invoke(Invocation::new("createCCTransferTo").with_args([payload]));
    let replay_id = TxId::from_hex(std::str::from_utf8(replay.payload().unwrap()).unwrap()).unwrap();
    let response = cc.execute_ids(vec![replay_id]);
    assert_eq!(
        response.tx_responses[0].error.as_ref().unwrap().error,
        "id transfer already exists"
    );
    assert_eq!(cc.net.allowed_balance("VT", &alice), Amount::new(4));

    // Close both sides.
    assert!(vt
        .robot_invoke(Invocation::new("commitCCTransferFrom").with_args(["t1"]))
        .is_success());
    assert!(cc
        .robot_invoke(Invocation::new("deleteCCTransferTo").with_args(["t1"]))
        .is_success());
    assert!(vt
        .robot_invoke(Invocation::new("deleteCCTransferFrom").with_args(["t1"]))
        .is_success());

    let missing = vt.invoke(Invocation::new("channelTransferFrom").with_args(["t1"]));
    assert!(!missing.is_success());
    assert!(logs_contain("Batch executed"));
}

#[test]
fn test_atomic_swap_between_channels() {
    let mut vt = Channel::new("VT");
    let mut cc = Channel::new("CC");
    let alice = test_address(1);
    vt.net.fund("VT", &alice, 10);
    let hash = Hash::digest(KEY.as_bytes()).to_hex();

    // Origin: begin locks the user's tokens and is reported as created.
    let tx = vt.submit(alice, 1, "swapBegin", &["VT", "CC", "4", &hash]);
    let response = vt.execute_ids(vec![tx.clone()]);
    assert!(response.tx_responses[0].is_success());
    assert_eq!(response.created_swaps.len(), 1);
    let swap = response.created_swaps[0].clone();
    assert_eq!(swap.id, tx);
    assert_eq!(swap.to, ChannelId::new("CC"));
    assert_eq!(vt.net.balance("VT", &alice), Amount::new(6));

    // Destination: the service mirrors it; the user reveals the key.
    let response = cc.execute(&Batch {
        swaps: vec![swap.clone()],
        ..Default::default()
    });
    assert!(response.swap_responses[0].error.is_none());

    let wrong = cc.invoke(Invocation::new("swapDone").with_args([tx.to_hex(), "guess".into()]));
    assert_eq!(wrong.error(), Some("incorrect key"));
    assert!(cc
        .invoke(Invocation::new("swapDone").with_args([tx.to_hex(), KEY.to_string()]))
        .is_success());
    assert_eq!(cc.net.allowed_balance("VT", &alice), Amount::new(4));
    let revealed = cc.net.ledger.events().last().unwrap().clone();
    assert_eq!(revealed.name, chainbatch_swap::KEY_EVENT);

    // Origin: the service replays the key and the swap closes.
    let response = vt.execute(&Batch {
        keys: vec![SwapKey {
            id: tx.clone(),
            key: KEY.to_string(),
        }],
        ..Default::default()
    });
    assert!(response.swap_key_responses[0].error.is_none());
    assert_eq!(vt.query("givenBalance", &["CC"]), "4");
    assert!(!vt
        .invoke(Invocation::new("swapGet").with_args([tx.to_hex()]))
        .is_success());
}

#[test]
fn test_swap_cancel_after_timeout() {
    let mut vt = Channel::new("VT");
    let alice = test_address(1);
    vt.net.fund("VT", &alice, 10);
    let hash = Hash::digest(KEY.as_bytes()).to_hex();

    let tx = vt.submit(alice, 1, "swapBegin", &["VT", "CC", "4", &hash]);
    vt.execute_ids(vec![tx.clone()]);

    let early = vt.submit(alice, 2, "swapCancel", &[&tx.to_hex()]);
    let response = vt.execute_ids(vec![early]);
    assert_eq!(
        response.tx_responses[0].error.as_ref().unwrap().error,
        "wait for timeout to end"
    );

    vt.net.advance(vt.cc.config().user_side_timeout_secs());
    let cancel = vt.submit(alice, 3, "swapCancel", &[&tx.to_hex()]);
    let response = vt.execute_ids(vec![cancel]);
    assert!(response.tx_responses[0].is_success());
    assert_eq!(vt.net.balance("VT", &alice), Amount::new(10));
}

#[test]
fn test_multi_swap_begin_reports_created() {
    let mut vt = Channel::new("VT");
    let alice = test_address(1);
    vt.net.fund("VT_1", &alice, 5);
    vt.net.fund("VT_2", &alice, 5);
    let assets = r#"[{"group":"VT_1","amount":"2"},{"group":"VT_2","amount":"3"}]"#;
    let hash = Hash::digest(KEY.as_bytes()).to_hex();

    let tx = vt.submit(alice, 1, "multiSwapBegin", &["VT", assets, "CC", &hash]);
    let response = vt.execute_ids(vec![tx.clone()]);
    assert!(response.tx_responses[0].is_success(), "{:?}", response.tx_responses[0].error);
    assert_eq!(response.created_multi_swaps.len(), 1);
    assert_eq!(vt.net.balance("VT_1", &alice), Amount::new(3));
    assert_eq!(vt.net.balance("VT_2", &alice), Amount::new(2));
    assert!(vt
        .invoke(Invocation::new("multiSwapGet").with_args([tx.to_hex()]))
        .is_success());
}

#[test]
fn test_health_check_needs_sender() {
    let mut vt = Channel::new("VT");
    assert!(!vt.invoke(Invocation::new("healthCheck")).is_success());
    let tx = vt.submit(test_address(1), 1, "healthCheck", &[]);
    assert!(vt.execute_ids(vec![tx]).tx_responses[0].is_success());
}
