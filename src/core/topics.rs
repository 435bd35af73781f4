//! Wirenboard 主題慣例集中在這裡，其他模組不自己拼字串。
//!
//! - 控制狀態（進）: `/devices/{name}/controls/K{i}`、`/devices/{name}/controls/Channel {i}`
//! - 控制命令（出）: 同上加 `/on`
//! - 燈具狀態（出）: `/devices/{name}/rgbw`
//! - 燈具命令（進）: `/devices/{name}/rgbw/set`

/// 訂閱單一設備全部主題的 filter
pub fn device_filter(name: &str) -> String {
    format!("/devices/{}/#", name)
}

pub fn control_state(name: &str, control: &str) -> String {
    format!("/devices/{}/controls/{}", name, control)
}

pub fn control_command(name: &str, control: &str) -> String {
    format!("/devices/{}/controls/{}/on", name, control)
}

pub fn light_state(name: &str) -> String {
    format!("/devices/{}/rgbw", name)
}

pub fn light_command(name: &str) -> String {
    format!("/devices/{}/rgbw/set", name)
}

/// Classification of one incoming topic, before any device lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTopic<'a> {
    /// `/devices/{name}/controls/{control}` — a controller state report.
    ControlState { device: &'a str, control: &'a str },
    /// `/devices/{name}/controls/{control}/on` — our own command echoed back.
    ControlEcho { device: &'a str },
    /// `/devices/{name}/rgbw` — our own state report echoed back.
    LightState { device: &'a str },
    /// `/devices/{name}/rgbw/set` — an inbound light command.
    LightCommand { device: &'a str },
    /// Anything else under `/devices/{name}/` (meta topics and the like).
    Other { device: &'a str },
    /// Not a `/devices/...` topic at all.
    Foreign,
}

pub fn parse(topic: &str) -> ParsedTopic<'_> {
    let Some(rest) = topic.strip_prefix("/devices/") else {
        return ParsedTopic::Foreign;
    };

    let Some((device, tail)) = rest.split_once('/') else {
        return ParsedTopic::Foreign;
    };
    if device.is_empty() {
        return ParsedTopic::Foreign;
    }

    if let Some(control) = tail.strip_prefix("controls/") {
        if control.ends_with("/on") {
            return ParsedTopic::ControlEcho { device };
        }
        // 控制名稱可能含空白 ("Channel 1")，但不會再有 '/'
        if control.is_empty() || control.contains('/') {
            return ParsedTopic::Other { device };
        }
        return ParsedTopic::ControlState { device, control };
    }

    match tail {
        "rgbw" => ParsedTopic::LightState { device },
        "rgbw/set" => ParsedTopic::LightCommand { device },
        _ => ParsedTopic::Other { device },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_control_topics() {
        assert_eq!(control_state("UD12", "K1"), "/devices/UD12/controls/K1");
        assert_eq!(
            control_command("UD12", "Channel 2"),
            "/devices/UD12/controls/Channel 2/on"
        );
        assert_eq!(light_state("UD12"), "/devices/UD12/rgbw");
        assert_eq!(light_command("UD12"), "/devices/UD12/rgbw/set");
        assert_eq!(device_filter("UD12"), "/devices/UD12/#");
    }

    #[test]
    fn test_parse_control_state() {
        assert_eq!(
            parse("/devices/UD12/controls/K3"),
            ParsedTopic::ControlState {
                device: "UD12",
                control: "K3"
            }
        );
        assert_eq!(
            parse("/devices/UD11/controls/Channel 4"),
            ParsedTopic::ControlState {
                device: "UD11",
                control: "Channel 4"
            }
        );
    }

    #[test]
    fn test_parse_ignores_command_echoes() {
        assert_eq!(
            parse("/devices/UD12/controls/K1/on"),
            ParsedTopic::ControlEcho { device: "UD12" }
        );
        assert_eq!(
            parse("/devices/UD12/controls/Channel 1/on"),
            ParsedTopic::ControlEcho { device: "UD12" }
        );
    }

    #[test]
    fn test_parse_light_topics() {
        assert_eq!(
            parse("/devices/UD12/rgbw"),
            ParsedTopic::LightState { device: "UD12" }
        );
        assert_eq!(
            parse("/devices/UD12/rgbw/set"),
            ParsedTopic::LightCommand { device: "UD12" }
        );
    }

    #[test]
    fn test_parse_foreign_and_meta_topics() {
        assert_eq!(parse("/other/UD12/controls/K1"), ParsedTopic::Foreign);
        assert_eq!(parse("/devices/"), ParsedTopic::Foreign);
        assert_eq!(parse("/devices/UD12"), ParsedTopic::Foreign);
        assert_eq!(
            parse("/devices/UD12/meta/driver"),
            ParsedTopic::Other { device: "UD12" }
        );
    }
}
