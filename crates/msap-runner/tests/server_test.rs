//! TCP round trips against a running node server.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;

use msap_core::sim::SimulatedNodeConfig;
use msap_protocol::*;
use msap_runner::{read_frame, MsapServer, RunnerConfig};

struct Host {
    stream: TcpStream,
    codec: FrameCodec,
    seq: u8,
}

impl Host {
    async fn connect(addr: std::net::SocketAddr) -> Host {
        Host {
            stream: TcpStream::connect(addr).await.expect("connect"),
            codec: FrameCodec::new(),
            seq: 0,
        }
    }

    async fn send_raw(&mut self, frame: &Frame) {
        let bytes = frame.encode().unwrap();
        self.stream.write_all(&bytes).await.unwrap();
    }

    async fn recv(&mut self) -> Frame {
        read_frame(&mut self.stream, &mut self.codec)
            .await
            .unwrap()
            .expect("frame before disconnect")
    }

    async fn request(&mut self, request: Request) -> Confirm {
        self.seq = self.seq.wrapping_add(1);
        self.send_raw(&request.to_frame(self.seq)).await;
        let frame = self.recv().await;
        assert_eq!(frame.sequence_id, self.seq);
        Confirm::decode(&frame).unwrap()
    }
}

async fn start_server(node: SimulatedNodeConfig) -> (std::net::SocketAddr, watch::Sender<bool>) {
    let config = RunnerConfig {
        listen: "127.0.0.1:0".to_string(),
        node,
        ..Default::default()
    };
    let server = MsapServer::bind(&config).await.unwrap();
    let addr = server.local_addr();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(server.run(rx));
    (addr, tx)
}

#[tokio::test]
async fn test_start_then_poll_delivers_stack_state() {
    let (addr, _shutdown) = start_server(SimulatedNodeConfig::router(1)).await;
    let mut host = Host::connect(addr).await;

    assert_eq!(
        host.request(Request::StackStart { autostart: false }).await,
        Confirm::StackStart {
            flags: StackStateFlags::STARTED
        }
    );

    assert_eq!(
        host.request(Request::IndicationPoll).await,
        Confirm::IndicationPoll { pending: 1 }
    );
    let indication = Indication::decode(&host.recv().await).unwrap();
    assert_eq!(
        indication,
        Indication::StackState {
            pending: 0,
            flags: StackStateFlags::STARTED
        }
    );

    assert_eq!(
        host.request(Request::IndicationPoll).await,
        Confirm::IndicationPoll { pending: 0 }
    );
}

#[tokio::test]
async fn test_malformed_frame_gets_no_confirm() {
    let (addr, _shutdown) = start_server(SimulatedNodeConfig::router(1)).await;
    let mut host = Host::connect(addr).await;

    // Stack stop with a payload is malformed and must be dropped silently.
    host.send_raw(&Frame::new(FUNC_STACK_STOP_REQ, 99, vec![0])).await;
    host.send_raw(&Frame::new(0x7E, 98, vec![])).await;

    assert_eq!(
        host.request(Request::AttributeRead { id: ATTR_ENERGY }).await,
        Confirm::AttributeRead {
            result: AttributeResult::Success,
            id: ATTR_ENERGY,
            value: vec![0]
        }
    );
}

#[tokio::test]
async fn test_attribute_write_over_tcp() {
    let (addr, _shutdown) = start_server(SimulatedNodeConfig::router(1)).await;
    let mut host = Host::connect(addr).await;

    assert_eq!(
        host.request(Request::AttributeWrite {
            id: ATTR_ENERGY,
            value: vec![77]
        })
        .await,
        Confirm::AttributeWrite(AttributeResult::Success)
    );

    // State survives reconnects.
    drop(host);
    let mut host = Host::connect(addr).await;
    assert_eq!(
        host.request(Request::AttributeRead { id: ATTR_ENERGY }).await,
        Confirm::AttributeRead {
            result: AttributeResult::Success,
            id: ATTR_ENERGY,
            value: vec![77]
        }
    );
}

#[tokio::test]
async fn test_scan_completion_is_delivered_after_poll() {
    let (addr, _shutdown) = start_server(SimulatedNodeConfig::router(1)).await;
    let mut host = Host::connect(addr).await;

    host.request(Request::StackStart { autostart: false }).await;
    assert_eq!(
        host.request(Request::ScanNeighbors).await,
        Confirm::ScanNeighbors(ScanNeighborsResult::Success)
    );

    assert_eq!(
        host.request(Request::IndicationPoll).await,
        Confirm::IndicationPoll { pending: 1 }
    );
    let first = Indication::decode(&host.recv().await).unwrap();
    assert_eq!(first.kind(), IndicationCode::StackState);
    let second = Indication::decode(&host.recv().await).unwrap();
    assert_eq!(
        second,
        Indication::ScanNeighbors {
            pending: 0,
            scan_ready: 1
        }
    );
}
