use crate::core::topics;
use crate::domain::model::{ChannelMap, DeviceState, PowerState, Publication, Rgbw, StateReport};
use crate::utils::error::{BridgeError, Result};

/// Razumdom 四通道 RGBW 調光器的純狀態模型。不做任何 I/O：
/// 輸入是控制主題的 payload，輸出是要發佈的 `Publication` 列表。
#[derive(Debug, Clone)]
pub struct RgbwDevice {
    name: String,
    channels: ChannelMap,
    state: DeviceState,
}

impl RgbwDevice {
    pub fn new(name: impl Into<String>, channels: ChannelMap) -> Self {
        Self {
            name: name.into(),
            channels,
            state: DeviceState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 套用一筆控制狀態更新 (`K{i}` 或 `Channel {i}`)。
    /// 回傳 true 表示有接受更新（即使值沒變也算，對應原行為：
    /// 每筆接受的訊息都會觸發狀態回報）。
    pub fn apply_control(&mut self, control: &str, payload: &str) -> Result<bool> {
        let value: i32 = payload
            .trim()
            .parse()
            .map_err(|_| BridgeError::DeviceError {
                device: self.name.clone(),
                message: format!("non-integer payload '{}' on control '{}'", payload, control),
            })?;

        if let Some(slot) = Self::relay_index(control) {
            self.state.relays[slot] = value;
            return Ok(true);
        }
        if let Some(slot) = Self::dimmer_index(control) {
            self.state.dimmers[slot] = value;
            return Ok(true);
        }

        Err(BridgeError::DeviceError {
            device: self.name.clone(),
            message: format!("unknown control '{}'", control),
        })
    }

    fn relay_index(control: &str) -> Option<usize> {
        let i: usize = control.strip_prefix('K')?.parse().ok()?;
        (1..=4).contains(&i).then(|| i - 1)
    }

    fn dimmer_index(control: &str) -> Option<usize> {
        let i: usize = control.strip_prefix("Channel ")?.parse().ok()?;
        (1..=4).contains(&i).then(|| i - 1)
    }

    /// 四個繼電器全部閉合才算開
    pub fn is_on(&self) -> bool {
        self.state.relays.iter().all(|&v| v > 0)
    }

    /// 開關命令：對 K1..K4 各發 "1" 或 "0"
    pub fn power_commands(&self, on: bool) -> Vec<Publication> {
        let payload = if on { "1" } else { "0" };
        (1..=4)
            .map(|i| Publication {
                topic: topics::control_command(&self.name, &format!("K{}", i)),
                payload: payload.to_string(),
            })
            .collect()
    }

    /// 目前顏色，硬體 0..=1000 縮放到 0..=255
    pub fn rgbw(&self) -> Rgbw {
        let read = |channel: u8| -> u8 {
            let raw = self.state.dimmers[(channel - 1) as usize];
            (((raw.clamp(0, 1000) as f64) * 255.0 / 1000.0).round()) as u8
        };
        Rgbw {
            r: read(self.channels.r),
            g: read(self.channels.g),
            b: read(self.channels.b),
            w: read(self.channels.w),
        }
    }

    /// 設色命令：0..=255 縮放到 0..=1000，發到各色對應的 Channel
    pub fn rgbw_commands(&self, color: Rgbw) -> Vec<Publication> {
        let command = |channel: u8, value: u8| Publication {
            topic: topics::control_command(&self.name, &format!("Channel {}", channel)),
            payload: (((value as f64) * 1000.0 / 255.0).round() as i32).to_string(),
        };
        vec![
            command(self.channels.r, color.r),
            command(self.channels.g, color.g),
            command(self.channels.b, color.b),
            command(self.channels.w, color.w),
        ]
    }

    /// 亮度 = 四個分量的算術平均
    pub fn brightness(&self) -> u8 {
        let color = self.rgbw();
        let sum = color.r as u32 + color.g as u32 + color.b as u32 + color.w as u32;
        ((sum as f64) / 4.0).round() as u8
    }

    pub fn brightness_commands(&self, value: u8) -> Vec<Publication> {
        self.rgbw_commands(Rgbw::uniform(value))
    }

    pub fn state_report(&self) -> StateReport {
        StateReport {
            state: if self.is_on() {
                PowerState::On
            } else {
                PowerState::Off
            },
            color: self.rgbw(),
            color_mode: "rgbw".to_string(),
            brightness: self.brightness(),
        }
    }
}
