//! 回环集成测试
//!
//! 绑定 127.0.0.1 随机端口，用普通的 std UDP 套接字往接收器
//! 发送真实字节流，验证完整链路与生命周期行为。

use freed_receiver::{
    FreedFrame, FreedScaling, MountConvention, PoseSample, ReceiverBuilder, ReceiverError,
    ReceiverState, pose_channel,
};
use std::net::UdpSocket;
use std::time::{Duration, Instant};

fn test_frame(camera_id: u8) -> FreedFrame {
    FreedFrame {
        camera_id,
        pan_deg: 12.5,
        tilt_deg: -3.25,
        roll_deg: 0.5,
        x_mm: 1500.0,
        y_mm: -250.0,
        z_mm: 1800.0,
        zoom: 4096.0,
        focus: 512.0,
        checksum: 0,
    }
}

#[test]
fn test_stop_without_traffic_is_prompt() {
    let (sink, _samples) = pose_channel(16);
    let mut receiver =
        ReceiverBuilder::new("127.0.0.1:0".parse().unwrap()).build(Box::new(sink));
    receiver.start().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Running);

    // 无任何流量时 stop() 也必须在限时内返回（Waker 打断 poll）
    let begin = Instant::now();
    receiver.stop().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Stopped);
    assert!(begin.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_single_frame_end_to_end() {
    let (sink, samples) = pose_channel(16);
    let mut receiver = ReceiverBuilder::new("127.0.0.1:0".parse().unwrap())
        .convention(MountConvention::neutral())
        .build(Box::new(sink));
    receiver.start().unwrap();
    let addr = receiver.local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let frame = test_frame(3);
    sender
        .send_to(&frame.encode(&FreedScaling::default()), addr)
        .unwrap();

    let sample = samples.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(sample.source_id, 3);
    // 毫米 → 米
    assert!((sample.position.x - 1.5).abs() < 1e-3);
    assert!((sample.position.y + 0.25).abs() < 1e-3);
    assert!((sample.position.z - 1.8).abs() < 1e-3);
    assert!((sample.zoom - 4096.0).abs() < 1.0);
    assert!((sample.orientation.norm() - 1.0).abs() < 1e-9);

    receiver.stop().unwrap();
    let metrics = receiver.metrics();
    assert_eq!(metrics.frames_decoded, 1);
    assert_eq!(metrics.decode_errors, 0);
}

#[test]
fn test_multiple_frames_per_datagram() {
    let (sink, samples) = pose_channel(64);
    let mut receiver =
        ReceiverBuilder::new("127.0.0.1:0".parse().unwrap()).build(Box::new(sink));
    receiver.start().unwrap();
    let addr = receiver.local_addr().unwrap();

    // 串口网桥风格：三帧打进一个数据报
    let mut payload = Vec::new();
    for id in 1..=3 {
        payload.extend_from_slice(&test_frame(id).encode(&FreedScaling::default()));
    }
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(&payload, addr).unwrap();

    for id in 1..=3 {
        let sample = samples.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(sample.source_id, id);
    }

    receiver.stop().unwrap();
    let metrics = receiver.metrics();
    assert_eq!(metrics.datagrams_received, 1);
    assert_eq!(metrics.frames_decoded, 3);
}

#[test]
fn test_malformed_flood_then_valid_frame() {
    let (sink, samples) = pose_channel(16);
    let mut receiver =
        ReceiverBuilder::new("127.0.0.1:0".parse().unwrap()).build(Box::new(sink));
    receiver.start().unwrap();
    let addr = receiver.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();

    // 1000 个校验和错误的帧：头部合法（0xD1），最后一字节破坏校验
    let mut bad = test_frame(1).encode(&FreedScaling::default());
    bad[28] = bad[28].wrapping_add(1);
    for _ in 0..1000 {
        sender.send_to(&bad, addr).unwrap();
        // 回环不保证不丢包，稍微限速降低内核丢弃的概率
        std::thread::sleep(Duration::from_micros(50));
    }

    // 之后一个有效帧必须正常投递
    sender
        .send_to(&test_frame(9).encode(&FreedScaling::default()), addr)
        .unwrap();
    let sample = samples.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(sample.source_id, 9);

    // 回环仍可能丢少量数据报，只要求大部分畸形帧被计数
    let metrics = receiver.metrics();
    assert_eq!(metrics.frames_decoded, 1);
    assert!(metrics.decode_errors >= 900, "decode_errors = {}", metrics.decode_errors);
    assert_eq!(metrics.datagrams_received, metrics.decode_errors + 1);

    receiver.stop().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Stopped);
}

#[test]
fn test_bind_conflict_reports_error() {
    let (sink_a, _samples_a) = pose_channel(4);
    let mut first =
        ReceiverBuilder::new("127.0.0.1:0".parse().unwrap()).build(Box::new(sink_a));
    first.start().unwrap();
    let addr = first.local_addr().unwrap();

    let (sink_b, _samples_b) = pose_channel(4);
    let mut second = ReceiverBuilder::new(addr).build(Box::new(sink_b));
    match second.start() {
        Err(ReceiverError::Bind { addr: reported, .. }) => assert_eq!(reported, addr),
        other => panic!("expected Bind error, got {:?}", other.map(|_| ())),
    }
    // 绑定失败后状态保持 Created，stop 仍然幂等
    assert_eq!(second.state(), ReceiverState::Created);
    second.stop().unwrap();
    first.stop().unwrap();
}

#[test]
fn test_shutdown_timeout_enters_failed() {
    // sink 长时间阻塞接收线程，stop() 无法在限时内确认线程退出
    let blocking_sink = |_sample: PoseSample| {
        std::thread::sleep(Duration::from_secs(5));
    };
    let mut receiver = ReceiverBuilder::new("127.0.0.1:0".parse().unwrap())
        .shutdown_timeout(Duration::from_millis(200))
        .build(Box::new(blocking_sink));
    receiver.start().unwrap();
    let addr = receiver.local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender
        .send_to(&test_frame(1).encode(&FreedScaling::default()), addr)
        .unwrap();
    // 等接收线程进入 sink 调用
    std::thread::sleep(Duration::from_millis(300));

    match receiver.stop() {
        Err(ReceiverError::ShutdownTimeout { timeout }) => {
            assert_eq!(timeout, Duration::from_millis(200));
        },
        other => panic!("expected ShutdownTimeout, got {:?}", other.map(|_| ())),
    }

    // 超时后状态是 Failed 且错误可查询，而不是卡在 Stopping
    let status = receiver.status();
    assert_eq!(status.state, ReceiverState::Failed);
    assert!(status.last_error.is_some());

    // 再次 stop() 把状态收尾到 Stopped
    receiver.stop().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Stopped);
}

#[test]
fn test_stop_is_idempotent_after_running() {
    let (sink, _samples) = pose_channel(4);
    let mut receiver =
        ReceiverBuilder::new("127.0.0.1:0".parse().unwrap()).build(Box::new(sink));
    receiver.start().unwrap();
    receiver.stop().unwrap();
    receiver.stop().unwrap();
    assert_eq!(receiver.state(), ReceiverState::Stopped);
}
