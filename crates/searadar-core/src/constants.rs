//! Simulation constants and default tuning parameters.

/// Simulation tick rate (Hz). One azimuth step is scanned per tick.
pub const TICK_RATE: u32 = 50;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Degrees in a full rotation.
pub const FULL_ROTATION_DEG: f64 = 360.0;

// --- Sensor frame ---

/// Default sensor frame height in pixels (tall vertical scan line).
pub const DEFAULT_HEIGHT_RES: u32 = 1024;

/// Default sensor frame width in pixels (narrow horizontal slice).
pub const DEFAULT_WIDTH_RES: u32 = 10;

/// Default vertical field of view of the beam (degrees).
pub const DEFAULT_VERTICAL_ANGLE_DEG: f64 = 30.0;

/// Default horizontal beam width (degrees).
pub const DEFAULT_BEAM_WIDTH_DEG: f64 = 2.0;

// --- Scan geometry ---

/// Default azimuth step (degrees per tick).
pub const DEFAULT_RESOLUTION_DEG: f64 = 0.5;

/// Default maximum instrumented range (meters).
pub const DEFAULT_MAX_RANGE: f64 = 5000.0;

/// Default minimum range / near clip (meters).
pub const DEFAULT_MIN_RANGE: f64 = 0.5;

/// Default number of range bins per PPI row.
pub const DEFAULT_IMAGE_RADIUS: u32 = 1000;

/// Returns at or below this distance are treated as sky/background and rejected.
pub const DEGENERATE_RANGE: f64 = 1.0;

// --- Signal model ---

/// Default minimum normal alignment for a surface to reflect.
pub const DEFAULT_PARALLEL_THRESHOLD: f64 = 0.45;

/// Default noise jitter amplitude (dB).
pub const DEFAULT_NOISE: f64 = 0.0;

/// Default transmitted power (watts).
pub const DEFAULT_TRANSMITTED_POWER_W: f64 = 1000.0;

/// Default antenna gain (dBi).
pub const DEFAULT_ANTENNA_GAIN_DBI: f64 = 30.0;

/// Default wavelength (meters), X-band 10 GHz.
pub const DEFAULT_WAVELENGTH_M: f64 = 0.03;

/// Default system losses (dB).
pub const DEFAULT_SYSTEM_LOSSES_DB: f64 = 3.0;

/// Default reflectivity for scene objects without an explicit value.
pub const DEFAULT_REFLECTIVITY: f64 = 1.0;

/// Typical radar cross section of a rain cell (square meters).
pub const DEFAULT_RAIN_RCS: f64 = 0.001;

/// Receiver reference power (watts, -120 dBm). Intensity counts are dB above this.
pub const RECEIVER_REFERENCE_POWER_W: f64 = 1.0e-15;

// --- Weather ---

/// Two-way specific attenuation in light rain (dB/km).
pub const LIGHT_RAIN_ATTENUATION_DB_PER_KM: f64 = 0.05;

/// Two-way specific attenuation in heavy rain (dB/km).
pub const HEAVY_RAIN_ATTENUATION_DB_PER_KM: f64 = 0.3;

/// Two-way specific attenuation in heavy rain with fog (dB/km).
pub const HEAVY_RAIN_FOG_ATTENUATION_DB_PER_KM: f64 = 0.5;

/// Rain drops sampled per PPI row in light rain.
pub const LIGHT_RAIN_DROPS: u32 = 15;

/// Rain drops sampled per PPI row in heavy rain.
pub const HEAVY_RAIN_DROPS: u32 = 20;

/// Rain drops sampled per PPI row in heavy rain with fog.
pub const HEAVY_RAIN_FOG_DROPS: u32 = 25;

// --- Registry / transport ---

/// Prefix of the logical broadcast channel for each radar (`/radar<id>`).
pub const RADAR_PATH_PREFIX: &str = "/radar";

/// Default number of rows in the radar placement grid.
pub const DEFAULT_PLACEMENT_ROWS: u32 = 1;

/// Default timeout for the export path waiting on the scene executor (ms).
pub const SCENE_QUERY_TIMEOUT_MS: u64 = 500;

/// Capacity of the export job queue between the tick thread and the broadcaster.
pub const EXPORT_QUEUE_CAPACITY: usize = 64;

/// Capacity of the driver's event queue to its handle.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;
