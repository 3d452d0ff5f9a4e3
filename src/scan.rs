//! Address range tools for finding where a drive keeps its live data.

use crate::error::{Result, VfdError};
use crate::scaling::Scaling;
use crate::transport::{MAX_READ_REGISTERS, Transport};

/// Register blocks worth probing on a Fuji drive: `(start, count)`.
pub const DEFAULT_BLOCKS: [(u16, u16); 9] = [
    (0, 50),
    (500, 50),
    (1000, 50),
    (1500, 50),
    (1800, 50),
    (2000, 50),
    (2100, 50),
    (2200, 50),
    (3000, 50),
];

pub const DEFAULT_SPAN_START: u16 = 2100;
pub const DEFAULT_SPAN_COUNT: u16 = 300;
/// A little under the protocol maximum; some drives choke on full frames.
pub const DEFAULT_BLOCK_SIZE: u16 = 120;
pub const DEFAULT_TOLERANCE: f32 = 0.5;
pub const DEFAULT_CHANGE_THRESHOLD: u16 = 5;

/// One past the highest wire address.
const ADDRESS_SPACE: u32 = u16::MAX as u32 + 1;

/// Read used to check the device is talking before a long scan.
pub const CONNECTIVITY_CHECK: (u16, u16) = (0, 10);

#[derive(Debug)]
pub struct BlockReport {
    pub start: u16,
    pub count: u16,
    pub result: Result<Vec<u16>>,
}

impl BlockReport {
    /// Last address covered by the block.
    pub fn end(&self) -> u16 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }
}

/// Try every block once; failures are recorded, not propagated.
pub async fn probe_blocks<T: Transport>(
    transport: &mut T,
    device_id: u8,
    blocks: &[(u16, u16)],
) -> Vec<BlockReport> {
    let mut reports = Vec::with_capacity(blocks.len());
    for &(start, count) in blocks {
        let result = transport
            .read_holding_registers(device_id, start, count)
            .await;
        match &result {
            Ok(words) => tracing::debug!("Block {}+{}: {} word(s)", start, count, words.len()),
            Err(e) => tracing::debug!("Block {}+{}: {}", start, count, e),
        }
        reports.push(BlockReport {
            start,
            count,
            result,
        });
    }
    reports
}

#[derive(Debug)]
pub struct SpanRead {
    pub start: u16,
    pub values: Vec<u16>,
    /// Address of the chunk that failed, and why. Reading stops there.
    pub failure: Option<(u16, VfdError)>,
}

impl SpanRead {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Read `count` registers from `start` in chunks of at most `block_size`.
///
/// A span running past the last wire address is cut short at 65535.
pub async fn read_span<T: Transport>(
    transport: &mut T,
    device_id: u8,
    start: u16,
    count: u16,
    block_size: u16,
) -> SpanRead {
    let block_size = block_size.clamp(1, MAX_READ_REGISTERS);
    let end = (u32::from(start) + u32::from(count)).min(ADDRESS_SPACE);
    let mut values = Vec::with_capacity((end - u32::from(start)) as usize);
    let mut address = u32::from(start);

    while address < end {
        let chunk = (end - address).min(u32::from(block_size)) as u16;
        let address_u16 = address as u16;
        match transport
            .read_holding_registers(device_id, address_u16, chunk)
            .await
        {
            Ok(words) => values.extend(words.into_iter().take(chunk as usize)),
            Err(e) => {
                tracing::warn!("Read error at {}: {}", address_u16, e);
                return SpanRead {
                    start,
                    values,
                    failure: Some((address_u16, e)),
                };
            }
        }
        address += u32::from(chunk);
    }

    SpanRead {
        start,
        values,
        failure: None,
    }
}

/// A value the operator can read off the drive's keypad display, and the
/// scaling the matching register is suspected to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTarget {
    pub label: &'static str,
    pub expected: f32,
    pub scaling: Scaling,
}

/// Temperature on a 0-60 °C loop and humidity on a 0-100 %RH loop.
pub fn default_targets(temperature: f32, humidity: f32) -> [MatchTarget; 2] {
    [
        MatchTarget {
            label: "Temp (0-60°C scale)",
            expected: temperature,
            scaling: Scaling::CurrentLoop { full_scale: 60.0 },
        },
        MatchTarget {
            label: "Humidity (0-100% scale)",
            expected: humidity,
            scaling: Scaling::CurrentLoop { full_scale: 100.0 },
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub address: u16,
    pub raw: u16,
    pub scaled: f32,
    pub label: &'static str,
}

/// Every register whose scaled value lies within `tolerance` of a target.
///
/// Candidates come out in address order; a register matching several
/// targets is listed once per target.
pub fn find_matches(
    start: u16,
    words: &[u16],
    targets: &[MatchTarget],
    tolerance: f32,
) -> Vec<Candidate> {
    let mut found = Vec::new();
    for (i, &raw) in words.iter().enumerate() {
        let address = start.wrapping_add(i as u16);
        for target in targets {
            let scaled = target.scaling.scale(raw);
            if (scaled - target.expected).abs() <= tolerance {
                found.push(Candidate {
                    address,
                    raw,
                    scaled,
                    label: target.label,
                });
            }
        }
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub address: u16,
    pub previous: u16,
    pub current: u16,
}

/// Reports registers that moved by more than a threshold between samples.
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    start: u16,
    threshold: u16,
    previous: Vec<u16>,
}

impl ChangeWatcher {
    /// The first sample is compared against all zeros.
    pub fn new(start: u16, count: u16, threshold: u16) -> Self {
        Self {
            start,
            threshold,
            previous: vec![0; count as usize],
        }
    }

    pub fn update(&mut self, sample: &[u16]) -> Vec<Change> {
        let changes = sample
            .iter()
            .enumerate()
            .filter_map(|(i, &current)| {
                let previous = self.previous.get(i).copied().unwrap_or(0);
                (current.abs_diff(previous) > self.threshold).then_some(Change {
                    address: self.start.wrapping_add(i as u16),
                    previous,
                    current,
                })
            })
            .collect();
        self.previous = sample.to_vec();
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[tokio::test]
    async fn test_probe_blocks_records_failures() {
        let mut transport = MockTransport::new()
            .with_registers(9, 2100, &[1, 2, 3])
            .with_failure(9, 3010);

        let reports = probe_blocks(&mut transport, 9, &DEFAULT_BLOCKS).await;
        assert_eq!(reports.len(), DEFAULT_BLOCKS.len());

        let ok = reports.iter().find(|r| r.start == 2100).unwrap();
        let words = ok.result.as_ref().unwrap();
        assert_eq!(words.len(), 50);
        assert_eq!(&words[..3], &[1, 2, 3]);
        assert_eq!(ok.end(), 2149);

        let failed = reports.iter().find(|r| r.start == 3000).unwrap();
        assert!(failed.result.is_err());
        assert_eq!(reports.iter().filter(|r| r.result.is_ok()).count(), 8);
    }

    #[tokio::test]
    async fn test_read_span_in_chunks() {
        let mut transport = MockTransport::new().with_registers(9, 2100, &[5; 300]);

        let span = read_span(&mut transport, 9, 2100, 300, 120).await;
        assert!(span.is_complete());
        assert_eq!(span.values.len(), 300);
        assert_eq!(
            transport.requests(),
            &[(9, 2100, 120), (9, 2220, 120), (9, 2340, 60)]
        );
    }

    #[tokio::test]
    async fn test_read_span_clamps_block_size() {
        let mut transport = MockTransport::new().with_device(1);
        let span = read_span(&mut transport, 1, 0, 200, 500).await;
        assert!(span.is_complete());
        assert_eq!(transport.requests(), &[(1, 0, 125), (1, 125, 75)]);
    }

    #[tokio::test]
    async fn test_read_span_stops_at_top_of_address_space() {
        let mut transport = MockTransport::new().with_registers(9, 65500, &[7; 36]);

        let span = read_span(&mut transport, 9, 65500, 100, 120).await;
        assert!(span.is_complete());
        assert_eq!(span.values, vec![7; 36]);
        assert_eq!(transport.requests(), &[(9, 65500, 36)]);
    }

    #[tokio::test]
    async fn test_read_span_stops_at_failure() {
        let mut transport = MockTransport::new()
            .with_device(9)
            .with_failure(9, 2250);

        let span = read_span(&mut transport, 9, 2100, 300, 120).await;
        assert_eq!(span.values.len(), 120);
        let (address, _) = span.failure.as_ref().unwrap();
        assert_eq!(*address, 2220);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_find_matches() {
        // 12000 µA is 30 °C on the 0-60 loop, 11800 µA is 48.75 % on the
        // 0-100 loop, 12100 µA is 30.375 °C
        let words = [0, 12000, 11800, 12100];
        let targets = default_targets(30.0, 48.75);
        let found = find_matches(2100, &words, &targets, DEFAULT_TOLERANCE);

        let addresses: Vec<(u16, &str)> = found.iter().map(|c| (c.address, c.label)).collect();
        assert_eq!(
            addresses,
            vec![
                (2101, "Temp (0-60°C scale)"),
                (2102, "Humidity (0-100% scale)"),
                (2103, "Temp (0-60°C scale)"),
            ]
        );
        assert!((found[0].scaled - 30.0).abs() < 1e-3);
        assert_eq!(found[1].raw, 11800);
    }

    #[test]
    fn test_find_matches_none() {
        let targets = default_targets(25.0, 50.0);
        assert!(find_matches(0, &[0, 1, 2], &targets, 0.5).is_empty());
    }

    #[test]
    fn test_change_watcher() {
        let mut watcher = ChangeWatcher::new(2100, 3, DEFAULT_CHANGE_THRESHOLD);

        let first = watcher.update(&[0, 6, 5]);
        assert_eq!(
            first,
            vec![Change {
                address: 2101,
                previous: 0,
                current: 6
            }]
        );

        assert!(watcher.update(&[3, 10, 5]).is_empty());

        let third = watcher.update(&[3, 0, 100]);
        assert_eq!(third.len(), 2);
        assert_eq!(third[0].address, 2101);
        assert_eq!(third[0].previous, 10);
        assert_eq!(third[1].address, 2102);
    }

    #[test]
    fn test_change_watcher_grows_with_sample() {
        let mut watcher = ChangeWatcher::new(0, 1, 5);
        let changes = watcher.update(&[0, 50]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].address, 1);
    }
}
