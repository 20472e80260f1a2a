//! Parser for the LeddarOne acquisition block (ten input registers from 20).

use crate::base::{Error, Result};
use crate::types::{Acquisition, Detection};
use log::{trace, warn};

const TIMESTAMP_LO: usize = 0;
const TIMESTAMP_HI: usize = 1;
const TEMPERATURE: usize = 2;
const DETECTION_COUNT: usize = 3;
const FIRST_DETECTION: usize = 4;
const REGISTERS_PER_DETECTION: usize = 2;

/// Distance registers are in millimeters.
const DISTANCE_SCALE: f32 = 1000.0;
/// Amplitude and temperature registers are 1/256 fixed point.
const FIXED_POINT_8_SCALE: f32 = 256.0;

/// Parses the registers of a LeddarOne acquisition block.
///
/// The detection count is clamped to `max_detections` before any detection
/// register is looked at.
pub fn parse_fixed(registers: &[u16], max_detections: usize) -> Result<Acquisition> {
    trace!("Parsing LeddarOne results from {} registers", registers.len());
    if registers.len() < FIRST_DETECTION {
        return Err(Error::ProtocolError {
            description: format!("{} result registers is too few", registers.len()),
        });
    }

    let reported = registers[DETECTION_COUNT] as usize;
    let count = reported.min(max_detections);
    if count < reported {
        warn!(
            "Sensor reported {} detections, keeping {}",
            reported, max_detections
        );
    }
    if registers.len() < FIRST_DETECTION + count * REGISTERS_PER_DETECTION {
        return Err(Error::ProtocolError {
            description: format!(
                "{} result registers cannot hold {} detections",
                registers.len(),
                count
            ),
        });
    }

    let detections = registers[FIRST_DETECTION..]
        .chunks_exact(REGISTERS_PER_DETECTION)
        .take(count)
        .map(|pair| Detection {
            distance: pair[0] as f32 / DISTANCE_SCALE,
            amplitude: pair[1] as f32 / FIXED_POINT_8_SCALE,
            segment: None,
            flags: None,
        })
        .collect();

    let acquisition = Acquisition {
        timestamp: (registers[TIMESTAMP_LO] as u32) | ((registers[TIMESTAMP_HI] as u32) << 16),
        temperature: Some(registers[TEMPERATURE] as f32 / FIXED_POINT_8_SCALE),
        states: None,
        detections,
    };
    trace!("Parsed LeddarOne acquisition: {:?}", acquisition);
    Ok(acquisition)
}
