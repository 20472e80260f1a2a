//! Parser for the detections answer (custom function 0x41) of multi-segment sensors.
//!
//! Layout: one count byte, five bytes per detection, then an optional trailer of a
//! 32-bit timestamp and 16-bit state bits. All multi-byte fields are little-endian.

use crate::base::{Error, Result};
use crate::types::{Acquisition, Detection};
use byteorder::{ByteOrder, LittleEndian};
use log::{trace, warn};

const DETECTION_SIZE: usize = 5;
const TRAILER_SIZE: usize = 6;

/// Distances are in centimeters.
const DISTANCE_SCALE: f32 = 100.0;
/// Amplitudes are 1/64 fixed point.
const AMPLITUDE_SCALE: f32 = 64.0;

#[inline]
fn parse_detection(bytes: &[u8]) -> Detection {
    Detection {
        distance: LittleEndian::read_u16(&bytes[0..2]) as f32 / DISTANCE_SCALE,
        amplitude: LittleEndian::read_u16(&bytes[2..4]) as f32 / AMPLITUDE_SCALE,
        segment: Some(bytes[4] >> 4),
        flags: Some(bytes[4] & 0x0F),
    }
}

/// Parses a detections answer.
///
/// The count is clamped to `max_detections` before decoding. The trailer
/// starts right after the detections the sensor announced; when the answer stops
/// before a complete trailer, timestamp and states are zero.
pub fn parse_variable(payload: &[u8], max_detections: usize) -> Result<Acquisition> {
    trace!("Parsing detections answer of {} bytes", payload.len());
    let reported = match payload.first() {
        Some(&count) => count as usize,
        None => {
            return Err(Error::ProtocolError {
                description: "empty detections answer".to_owned(),
            })
        }
    };

    let count = reported.min(max_detections);
    if count < reported {
        warn!(
            "Sensor reported {} detections, keeping {}",
            reported, max_detections
        );
    }
    let detections_end = 1 + count * DETECTION_SIZE;
    if payload.len() < detections_end {
        return Err(Error::ProtocolError {
            description: format!(
                "answer of {} bytes cannot hold {} detections",
                payload.len(),
                count
            ),
        });
    }

    let detections = payload[1..detections_end]
        .chunks_exact(DETECTION_SIZE)
        .map(parse_detection)
        .collect();

    let trailer_at = 1 + reported * DETECTION_SIZE;
    let (timestamp, states) = match payload.get(trailer_at..trailer_at + TRAILER_SIZE) {
        Some(trailer) => (
            LittleEndian::read_u32(&trailer[0..4]),
            LittleEndian::read_u16(&trailer[4..6]),
        ),
        None => {
            trace!("No timestamp/states trailer at offset {}", trailer_at);
            (0, 0)
        }
    };

    let acquisition = Acquisition {
        timestamp,
        temperature: None,
        states: Some(states),
        detections,
    };
    trace!("Parsed multi-segment acquisition: {:?}", acquisition);
    Ok(acquisition)
}
