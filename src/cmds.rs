// Standard Modbus functions

/// Function code to read one or more holding (read/write) registers.
pub const MODBUS_FN_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Function code to read one or more input (read-only) registers.
pub const MODBUS_FN_READ_INPUT_REGISTERS: u8 = 0x04;

/// Function code to write a single holding register.
pub const MODBUS_FN_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Function code to request the server identification. Used as a presence check
/// when connecting.
pub const MODBUS_FN_REPORT_SERVER_ID: u8 = 0x11;

/// Most registers a single read may request: the reply payload holds one byte
/// count plus two bytes per register.
pub const MODBUS_MAX_READ_REGISTERS: u16 = 125;

// Leddar custom functions

/// Custom function returning the detections of the last acquisition, followed by
/// the timestamp and state bits. Empty request payload.
pub const LEDDAR_FN_GET_DETECTIONS: u8 = 0x41;

/// Custom function asking the sensor to save its configuration to permanent
/// memory. Empty request payload.
pub const LEDDAR_FN_WRITE_CONFIGURATION: u8 = 0x46;

// Input registers

/// First input register of the LeddarOne acquisition block.
pub const LEDDAR_ONE_RESULTS_BASE_REGISTER: u16 = 20;

/// Number of input registers in the LeddarOne acquisition block: timestamp (2),
/// temperature, detection count, then distance and amplitude per detection.
pub const LEDDAR_ONE_RESULTS_REGISTER_COUNT: u16 = 10;

/// Input register holding the internal temperature on M16/IS16 sensors (1/256 °C).
pub const LEDDAR_TEMPERATURE_REGISTER: u16 = 0;
