use serde::Serialize;

use crate::text::{parse_leading_int, split_arguments};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    PushToggle,
    Lever,
    Flat,
    Panorama,
    Tilt,
}

impl ControlKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "push_toggle" => ControlKind::PushToggle,
            "lever" => ControlKind::Lever,
            "flat" => ControlKind::Flat,
            "pana" => ControlKind::Panorama,
            "tilt" => ControlKind::Tilt,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlKind::PushToggle => "push_toggle",
            ControlKind::Lever => "lever",
            ControlKind::Flat => "flat",
            ControlKind::Panorama => "pana",
            ControlKind::Tilt => "tilt",
        }
    }

    /// Flat, panorama and tilt blocks describe how the background is
    /// projected rather than an interactive widget.
    pub fn is_projection(self) -> bool {
        matches!(
            self,
            ControlKind::Flat | ControlKind::Panorama | ControlKind::Tilt
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn parse(args: &str) -> Option<Self> {
        let values: Vec<i32> = split_arguments(args)
            .iter()
            .map(|token| parse_leading_int(token).map(|value| value as i32))
            .collect::<Option<_>>()?;
        match values.as_slice() {
            [left, top, right, bottom, ..] => Some(Rect {
                left: *left,
                top: *top,
                right: *right,
                bottom: *bottom,
            }),
            _ => None,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    Flat,
    Panorama {
        angle: f32,
        linear_scale: f32,
        reversed: bool,
    },
    Tilt {
        angle: f32,
        linear_scale: f32,
        reversed: bool,
    },
}

/// One `name(args)` line from a control body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlProperty {
    pub name: String,
    pub args: String,
}

impl ControlProperty {
    pub fn parse(line: &str) -> Option<Self> {
        let open = line.find('(')?;
        let close = line.rfind(')').filter(|&close| close > open)?;
        let name = line[..open].trim();
        if name.is_empty() {
            return None;
        }
        Some(ControlProperty {
            name: name.to_ascii_lowercase(),
            args: line[open + 1..close].trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlDef {
    pub key: u32,
    pub kind: ControlKind,
    pub properties: Vec<ControlProperty>,
}

impl ControlDef {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.args.as_str())
    }

    pub fn hotspot(&self) -> Option<Rect> {
        ["flat_hotspot", "warp_hotspot", "hotspot"]
            .iter()
            .find_map(|name| self.property(name))
            .and_then(Rect::parse)
    }

    pub fn cursor(&self) -> Option<&str> {
        self.property("cursor")
    }

    pub fn int_property(&self, name: &str) -> Option<i32> {
        self.property(name)
            .and_then(parse_leading_int)
            .map(|value| value as i32)
    }

    pub fn projection(&self) -> Option<Projection> {
        let float = |name: &str, default: f32| {
            self.property(name)
                .and_then(|value| value.trim().parse::<f32>().ok())
                .unwrap_or(default)
        };
        match self.kind {
            ControlKind::Flat => Some(Projection::Flat),
            ControlKind::Panorama => Some(Projection::Panorama {
                angle: float("angle", 27.0),
                linear_scale: float("linscale", 0.55),
                reversed: self.int_property("reversepana").unwrap_or(0) == 1,
            }),
            ControlKind::Tilt => Some(Projection::Tilt {
                angle: float("angle", 27.0),
                linear_scale: float("linscale", 0.65),
                reversed: self.int_property("reverse").unwrap_or(0) == 1,
            }),
            ControlKind::PushToggle | ControlKind::Lever => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(kind: ControlKind, lines: &[&str]) -> ControlDef {
        ControlDef {
            key: 9,
            kind,
            properties: lines
                .iter()
                .filter_map(|line| ControlProperty::parse(line))
                .collect(),
        }
    }

    #[test]
    fn hotspot_reads_flat_hotspot_property() {
        let toggle = control(
            ControlKind::PushToggle,
            &["flat_hotspot(130, 276, 246, 364)", "cursor(handpt)"],
        );
        let rect = toggle.hotspot().expect("hotspot present");
        assert!(rect.contains(130, 276));
        assert!(!rect.contains(246, 300));
        assert_eq!(toggle.cursor(), Some("handpt"));
    }

    #[test]
    fn panorama_projection_uses_properties_and_defaults() {
        let pana = control(
            ControlKind::Panorama,
            &["angle(30.5)", "reversepana(1)"],
        );
        assert_eq!(
            pana.projection(),
            Some(Projection::Panorama {
                angle: 30.5,
                linear_scale: 0.55,
                reversed: true
            })
        );
        assert!(control(ControlKind::Lever, &[]).projection().is_none());
    }

    #[test]
    fn property_lines_need_parentheses() {
        assert!(ControlProperty::parse("venus_id").is_none());
        let property = ControlProperty::parse("Count_To(3)").expect("property");
        assert_eq!(property.name, "count_to");
        assert_eq!(property.args, "3");
    }
}
