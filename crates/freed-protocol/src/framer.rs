//! 字节流分帧状态机
//!
//! 套接字读出来的是任意长度的字节块：一个数据报可能携带多帧、
//! 半帧，或者被损坏的前缀。`StreamFramer` 维护一个内部累积缓冲，
//! 从中切出定长候选帧交给解码器。
//!
//! 重同步策略：缓冲头部不是命令字节时**恰好丢弃一个字节**后重试。
//! 漂移有界——有限长度的损坏串在有效流量恢复后必然重新对齐，
//! 且不会多丢。

use crate::constants::{FRAME_LEN, MSG_CAMERA_DATA};

/// 增量分帧器
///
/// 只操作已经交付的缓冲字节，从不阻塞。跨 `push` 调用保持状态，
/// 因此帧可以任意切分在多个数据块之间。
#[derive(Debug, Default)]
pub struct StreamFramer {
    buf: Vec<u8>,
    bytes_skipped: u64,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个新收到的字节块
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// 取出下一个候选帧
    ///
    /// 返回的是 29 字节的**候选**：头部是命令字节且长度足够，
    /// 但校验尚未验证——由 `FreedFrame::decode` 决定取舍。
    /// 缓冲中没有完整候选时返回 `None`。
    pub fn next_frame(&mut self) -> Option<[u8; FRAME_LEN]> {
        // 先跳过头部的非命令字节（每次恰好一个，这里批量等价处理）
        let start = self.buf.iter().position(|&b| b == MSG_CAMERA_DATA);
        match start {
            Some(0) => {},
            Some(n) => {
                self.bytes_skipped += n as u64;
                self.buf.drain(..n);
            },
            None => {
                self.bytes_skipped += self.buf.len() as u64;
                self.buf.clear();
                return None;
            },
        }

        if self.buf.len() < FRAME_LEN {
            return None;
        }

        let mut frame = [0u8; FRAME_LEN];
        frame.copy_from_slice(&self.buf[..FRAME_LEN]);
        self.buf.drain(..FRAME_LEN);
        Some(frame)
    }

    /// 累计因重同步丢弃的字节数
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    /// 当前缓冲的字节数（尚不足一帧的余量）
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FreedFrame, FreedScaling};

    fn valid_frame_bytes(pan_deg: f64) -> [u8; FRAME_LEN] {
        FreedFrame {
            camera_id: 1,
            pan_deg,
            tilt_deg: 0.0,
            roll_deg: 0.0,
            x_mm: 0.0,
            y_mm: 0.0,
            z_mm: 0.0,
            zoom: 0.0,
            focus: 0.0,
            checksum: 0,
        }
        .encode(&FreedScaling::default())
    }

    #[test]
    fn test_single_frame_single_chunk() {
        let mut framer = StreamFramer::new();
        framer.push(&valid_frame_bytes(10.0));

        let frame = framer.next_frame().expect("one frame buffered");
        assert_eq!(frame[0], MSG_CAMERA_DATA);
        assert!(framer.next_frame().is_none());
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        // 半包：帧被切分在任意位置都要能重组
        let bytes = valid_frame_bytes(1.0);
        for split in 1..FRAME_LEN {
            let mut framer = StreamFramer::new();
            framer.push(&bytes[..split]);
            assert!(framer.next_frame().is_none(), "split at {}", split);
            framer.push(&bytes[split..]);
            assert_eq!(framer.next_frame(), Some(bytes), "split at {}", split);
        }
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut framer = StreamFramer::new();
        let mut chunk = Vec::new();
        for i in 0..5 {
            chunk.extend_from_slice(&valid_frame_bytes(i as f64));
        }
        framer.push(&chunk);

        let mut count = 0;
        while framer.next_frame().is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn test_resync_after_garbage_prefix() {
        let mut framer = StreamFramer::new();
        framer.push(&[0x00, 0xFF, 0x42]);
        framer.push(&valid_frame_bytes(2.0));

        let frame = framer.next_frame().expect("resync onto valid frame");
        assert_eq!(frame, valid_frame_bytes(2.0));
        assert_eq!(framer.bytes_skipped(), 3);
    }

    #[test]
    fn test_one_corrupt_byte_loses_at_most_one_frame() {
        // 流中混入一个损坏字节，其后 N 个有效帧最多丢一帧
        let scaling = FreedScaling::default();
        let mut stream = Vec::new();
        stream.push(0xD1u8); // 伪装成命令字节的孤立损坏字节
        const N: usize = 10;
        for i in 0..N {
            stream.extend_from_slice(&valid_frame_bytes(i as f64));
        }

        let mut framer = StreamFramer::new();
        framer.push(&stream);

        let mut valid = 0;
        let mut rejected = 0;
        while let Some(candidate) = framer.next_frame() {
            match FreedFrame::decode(&candidate, &scaling) {
                Ok(_) => valid += 1,
                Err(_) => rejected += 1,
            }
        }
        // 损坏字节把第一帧拖进了一个坏候选，后续全部恢复
        assert!(valid >= N - 1, "recovered {} of {}", valid, N);
        assert!(rejected <= 1);
    }

    #[test]
    fn test_pure_garbage_is_discarded() {
        let mut framer = StreamFramer::new();
        framer.push(&[0x01, 0x02, 0x03, 0x04]);
        assert!(framer.next_frame().is_none());
        assert_eq!(framer.bytes_skipped(), 4);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_empty_push() {
        let mut framer = StreamFramer::new();
        framer.push(&[]);
        assert!(framer.next_frame().is_none());
    }

    #[test]
    fn test_state_survives_across_datagrams() {
        // 分帧器状态跨数据报保持：前一个报文的尾巴接上后一个报文的头
        let bytes = valid_frame_bytes(7.0);
        let mut framer = StreamFramer::new();
        framer.push(&bytes[..20]);
        assert!(framer.next_frame().is_none());
        assert_eq!(framer.buffered_len(), 20);
        framer.push(&bytes[20..]);
        assert_eq!(framer.next_frame(), Some(bytes));
    }
}
