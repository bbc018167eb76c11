//! Shared doubles for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, uint, Address, TxHash, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use mpc_transfer::blockchain::node::{ChainNode, FeeEstimator};
use mpc_transfer::blockchain::transaction::UnsignedTransaction;
use mpc_transfer::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use mpc_transfer::signing::service::{SigningService, SigningServiceError};
use mpc_transfer::signing::types::{
    DerivationPath, RemoteSignature, RequestId, SignedMessage, SigningAlgorithm, SigningRequest,
    StatusReport,
};

// Anvil dev accounts 0 and 1
pub const ANVIL_0_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ANVIL_0_PUBLIC: &str = "048318535b54105d4a7aae60c08fc45f9687181b4fdfc625bd1a753fa7397fed753547f11ca8696646f2f3acb08e31016afac23e630c5d11f59f61fef57b0d2aa5";
pub const ANVIL_1_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const ANVIL_1_PUBLIC: &str = "04ba5734d8f7091719471e7f7ed6b9df170dc70cc661ca05e688601ad984f068b0d67351e5f06073092499336ab0839ef8a521afd334e53807205fa2f08eec74f4";

pub const SOURCE_PATH: [u32; 5] = [44, 60, 0, 0, 0];
pub const DESTINATION_PATH: [u32; 5] = [44, 60, 0, 0, 1];

const SECP256K1_N: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

pub fn anvil_0() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

pub fn anvil_1() -> Address {
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap()
}

/// How the mock signing service finishes a request.
#[derive(Debug, Clone)]
pub enum Finish {
    /// `COMPLETED` with a signature from the key behind the path.
    Complete,
    /// `COMPLETED`, signed by this key instead.
    CompleteWithKey(&'static str),
    /// `COMPLETED`, but the echoed content is a different hash.
    CompleteWrongContent,
    /// `COMPLETED` with `v` reported as 27/28.
    CompleteLegacyV,
    /// `COMPLETED` with the equivalent high-s signature.
    CompleteHighS,
    /// `COMPLETED`, echoing this derivation path instead of the submitted one.
    CompleteEchoingPath(&'static [u32]),
    /// Every status query fails with a transport error.
    StatusUnreachable,
    /// A terminal failure status such as `REJECTED`.
    Terminal(&'static str),
    /// Stays pending forever.
    Never,
}

#[derive(Default)]
struct MockSigningState {
    submitted: Vec<SigningRequest>,
    polls: usize,
    public_key_calls: Vec<DerivationPath>,
    create_calls: usize,
}

/// In-process signing service that signs with Anvil dev keys.
pub struct MockSigningService {
    keys: HashMap<Vec<u32>, (&'static str, &'static str)>,
    pending: Vec<&'static str>,
    finish: Finish,
    fail_create: bool,
    state: Mutex<MockSigningState>,
}

impl MockSigningService {
    /// `pending` statuses are reported in order before `finish`.
    pub fn new(pending: Vec<&'static str>, finish: Finish) -> Self {
        let mut keys = HashMap::new();
        keys.insert(SOURCE_PATH.to_vec(), (ANVIL_0_KEY, ANVIL_0_PUBLIC));
        keys.insert(DESTINATION_PATH.to_vec(), (ANVIL_1_KEY, ANVIL_1_PUBLIC));
        Self {
            keys,
            pending,
            finish,
            fail_create: false,
            state: Mutex::new(MockSigningState::default()),
        }
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn submitted(&self) -> Vec<SigningRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn public_key_calls(&self) -> Vec<DerivationPath> {
        self.state.lock().unwrap().public_key_calls.clone()
    }

    fn report(&self, id: &RequestId, status: &str, messages: Vec<SignedMessage>) -> StatusReport {
        StatusReport {
            id: id.to_string(),
            status: status.to_string(),
            sub_status: None,
            signed_messages: messages,
            extra: Default::default(),
        }
    }

    fn sign(&self, request: &SigningRequest, key: &str, content: B256, legacy_v: bool) -> SignedMessage {
        let signer: PrivateKeySigner = key.parse().unwrap();
        let sig = signer.sign_hash_sync(&request.payload_hash).unwrap();
        let parity = sig.v() as u64;
        self.message(request, content, sig.r(), sig.s(), if legacy_v { parity + 27 } else { parity })
    }

    fn sign_high_s(&self, request: &SigningRequest, key: &str) -> SignedMessage {
        let signer: PrivateKeySigner = key.parse().unwrap();
        let sig = signer.sign_hash_sync(&request.payload_hash).unwrap();
        let high_s = SECP256K1_N - sig.s();
        self.message(request, request.payload_hash, sig.r(), high_s, !sig.v() as u64)
    }

    fn message(&self, request: &SigningRequest, content: B256, r: U256, s: U256, v: u64) -> SignedMessage {
        SignedMessage {
            content: hex::encode(content),
            derivation_path: request.derivation_path.components().to_vec(),
            signature: RemoteSignature {
                r: hex::encode(r.to_be_bytes::<32>()),
                s: hex::encode(s.to_be_bytes::<32>()),
                v,
                full_sig: None,
            },
            public_key: None,
        }
    }
}

#[async_trait]
impl SigningService for MockSigningService {
    async fn get_public_key(
        &self,
        _algorithm: SigningAlgorithm,
        path: &DerivationPath,
        compressed: bool,
    ) -> Result<String, SigningServiceError> {
        assert!(!compressed, "only uncompressed keys are requested");
        self.state.lock().unwrap().public_key_calls.push(path.clone());
        self.keys
            .get(path.components())
            .map(|(_, public)| public.to_string())
            .ok_or_else(|| SigningServiceError::Http {
                status: 404,
                body: format!("no key at {}", path),
            })
    }

    async fn create_signing_request(
        &self,
        request: &SigningRequest,
    ) -> Result<RequestId, SigningServiceError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if self.fail_create {
            return Err(SigningServiceError::Transport("connection reset".to_string()));
        }
        state.submitted.push(request.clone());
        Ok(RequestId::from(format!("req-{}", state.submitted.len())))
    }

    async fn get_status(&self, id: &RequestId) -> Result<StatusReport, SigningServiceError> {
        let (poll, request) = {
            let mut state = self.state.lock().unwrap();
            state.polls += 1;
            (state.polls, state.submitted.last().cloned())
        };
        let request = request.expect("poll before submit");
        if matches!(self.finish, Finish::StatusUnreachable) {
            return Err(SigningServiceError::Transport("connection reset".to_string()));
        }

        if poll <= self.pending.len() {
            return Ok(self.report(id, self.pending[poll - 1], vec![]));
        }

        let (key, _) = self.keys[request.derivation_path.components()];
        let hash = request.payload_hash;
        let report = match &self.finish {
            Finish::Complete => self.report(id, "COMPLETED", vec![self.sign(&request, key, hash, false)]),
            Finish::CompleteWithKey(other) => {
                self.report(id, "COMPLETED", vec![self.sign(&request, other, hash, false)])
            }
            Finish::CompleteWrongContent => self.report(
                id,
                "COMPLETED",
                vec![self.sign(&request, key, keccak256(hash), false)],
            ),
            Finish::CompleteLegacyV => {
                self.report(id, "COMPLETED", vec![self.sign(&request, key, hash, true)])
            }
            Finish::CompleteHighS => {
                self.report(id, "COMPLETED", vec![self.sign_high_s(&request, key)])
            }
            Finish::CompleteEchoingPath(path) => {
                let mut message = self.sign(&request, key, hash, false);
                message.derivation_path = path.to_vec();
                self.report(id, "COMPLETED", vec![message])
            }
            Finish::StatusUnreachable => unreachable!(),
            Finish::Terminal(status) => {
                let mut report = self.report(id, status, vec![]);
                report.sub_status = Some("BY_POLICY".to_string());
                report
            }
            Finish::Never => self.report(id, "PENDING_SIGNATURE", vec![]),
        };
        Ok(report)
    }
}

/// How the mock node answers `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub enum SendReply {
    Accept,
    Reject(&'static str),
    Drop,
}

/// In-process node with fixed state.
pub struct MockNode {
    pub chain_id: u64,
    pub balances: HashMap<Address, U256>,
    pub nonce: u64,
    pub gas_price: u128,
    pub reply: SendReply,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockNode {
    pub fn new(chain_id: u64, source_balance: u64, nonce: u64, gas_price: u128) -> Self {
        let mut balances = HashMap::new();
        balances.insert(anvil_0(), U256::from(source_balance));
        Self {
            chain_id,
            balances,
            nonce,
            gas_price,
            reply: SendReply::Accept,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: SendReply) -> Self {
        self.reply = reply;
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeeEstimator for MockNode {
    async fn estimate_gas_price(&self, _tx: &UnsignedTransaction) -> BlockchainResult<u128> {
        Ok(self.gas_price)
    }
}

#[async_trait]
impl ChainNode for MockNode {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        Ok(ChainId(self.chain_id))
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        Ok(self.balances.get(&address).copied().unwrap_or_default())
    }

    async fn get_transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        Ok(self.nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        self.sent.lock().unwrap().push(raw.to_vec());
        match &self.reply {
            SendReply::Accept => Ok(keccak256(raw)),
            SendReply::Reject(reason) => Err(BlockchainError::Rejected(reason.to_string())),
            SendReply::Drop => Err(BlockchainError::Rpc("connection reset by peer".to_string())),
        }
    }
}

/// A request captured by the programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, exactly as sent.
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// Every request is recorded, then answered with `(status, body)` from `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Arc<Mutex<Vec<RecordedRequest>>>)
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = recorded.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request.clone());
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorded)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}
