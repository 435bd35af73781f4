use serde::{Deserialize, Serialize};

/// Hardware channel assignment for one RGBW device: which of the four
/// dimmer channels drives each color component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelMap {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

/// Raw controller state as reported on the control topics: four relay
/// outputs (K1..K4) and four dimmer outputs (Channel 1..Channel 4, 0..=1000).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub relays: [i32; 4],
    pub dimmers: [i32; 4],
}

/// RGBW color with 0..=255 components.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgbw {
    #[serde(default)]
    pub r: u8,
    #[serde(default)]
    pub g: u8,
    #[serde(default)]
    pub b: u8,
    #[serde(default)]
    pub w: u8,
}

impl Rgbw {
    pub fn uniform(value: u8) -> Self {
        Self {
            r: value,
            g: value,
            b: value,
            w: value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

/// Inbound command on `/devices/{name}/rgbw/set`. Every field is optional;
/// unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LightCommand {
    pub state: Option<PowerState>,
    pub color: Option<Rgbw>,
    pub brightness: Option<u8>,
}

/// Outbound state published on `/devices/{name}/rgbw`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateReport {
    pub state: PowerState,
    pub color: Rgbw,
    pub color_mode: String,
    pub brightness: u8,
}

/// One message to be published on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
}
