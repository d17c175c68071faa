//! Extension metadata exposed to the block editor.
//!
//! Static descriptor tables for the video and audio palettes, plus the
//! dynamic `markers` menu, which is rebuilt per target: a synthesized
//! "start" entry, one entry per authored marker, and "end".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::runtime::Runtime;
use crate::entities::target::TargetKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Command,
    Reporter,
    Boolean,
    Hat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgType {
    Number,
    String,
}

/// One placeholder argument of a block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDescriptor {
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,
    pub default_value: String,
}

impl ArgumentDescriptor {
    fn number(default: &str) -> Self {
        Self {
            arg_type: ArgType::Number,
            menu: None,
            default_value: default.to_string(),
        }
    }

    fn menu(menu: &str, default: &str) -> Self {
        Self {
            arg_type: ArgType::String,
            menu: Some(menu.to_string()),
            default_value: default.to_string(),
        }
    }
}

/// One block of an extension palette.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    pub opcode: String,
    pub block_type: BlockType,
    /// Display template with [PLACEHOLDERS].
    pub text: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub arguments: HashMap<String, ArgumentDescriptor>,
}

impl BlockDescriptor {
    fn new(opcode: &str, block_type: BlockType, text: &str) -> Self {
        Self {
            opcode: opcode.to_string(),
            block_type,
            text: text.to_string(),
            arguments: HashMap::new(),
        }
    }

    fn arg(mut self, name: &str, descriptor: ArgumentDescriptor) -> Self {
        self.arguments.insert(name.to_string(), descriptor);
        self
    }
}

/// One entry of a block menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub text: String,
    pub value: String,
}

impl MenuEntry {
    fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Palette metadata for one extension.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub id: String,
    pub name: String,
    pub blocks: Vec<BlockDescriptor>,
    #[serde(default)]
    pub menus: HashMap<String, Vec<MenuEntry>>,
}

/// Build the dynamic `markers` menu for a target: "start", the authored
/// markers in order, then "end". Values are frame or sample numbers as
/// strings. An unresolved target yields the n/a placeholder.
pub fn markers_menu(runtime: &Runtime, target_id: Option<Uuid>) -> Vec<MenuEntry> {
    let target = target_id.and_then(|id| runtime.get_target_by_id(id));
    let Some(target) = target else {
        return vec![MenuEntry::new("n/a", "0")];
    };

    match target {
        TargetKind::Video(video) => {
            let mut entries = vec![MenuEntry::new("start", format_number(video.trim_start))];
            for (i, marker) in video.markers.iter().enumerate() {
                entries.push(MenuEntry::new(format!("{}", i + 1), format_number(*marker)));
            }
            entries.push(MenuEntry::new("end", format_number(video.trim_end)));
            entries
        }
        TargetKind::Audio(audio) => {
            let mut entries = vec![MenuEntry::new("start", format_number(audio.trim_start))];
            for (i, marker) in audio.markers.iter().enumerate() {
                entries.push(MenuEntry::new(format!("{}", i + 1), marker.to_string()));
            }
            entries.push(MenuEntry::new("end", format_number(audio.trim_end)));
            entries
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Palette for the video extension.
pub fn video_extension_info() -> ExtensionInfo {
    let direction_menu = vec![
        MenuEntry::new("forward", "forward"),
        MenuEntry::new("backward", "backward"),
    ];
    let effects_menu = vec![
        MenuEntry::new("color", "color"),
        MenuEntry::new("whirl", "whirl"),
        MenuEntry::new("brightness", "brightness"),
        MenuEntry::new("ghost", "ghost"),
    ];

    let blocks = vec![
        BlockDescriptor::new(
            "playEntireVideoUntilDone",
            BlockType::Command,
            "play entire video until done",
        ),
        BlockDescriptor::new(
            "playVideoFromAToB",
            BlockType::Command,
            "play from [A] to [B] until done",
        )
        .arg("A", ArgumentDescriptor::menu("markers", "0"))
        .arg("B", ArgumentDescriptor::menu("markers", "0")),
        BlockDescriptor::new(
            "playForwardReverseUntilDone",
            BlockType::Command,
            "play [DIRECTION] until done",
        )
        .arg("DIRECTION", ArgumentDescriptor::menu("playDirection", "forward")),
        BlockDescriptor::new(
            "startPlayingForwardReverse",
            BlockType::Command,
            "start playing [DIRECTION]",
        )
        .arg("DIRECTION", ArgumentDescriptor::menu("playDirection", "forward")),
        BlockDescriptor::new("stopPlaying", BlockType::Command, "stop playing"),
        BlockDescriptor::new("playNFrames", BlockType::Command, "play [N] frames")
            .arg("N", ArgumentDescriptor::number("30")),
        BlockDescriptor::new("goToFrame", BlockType::Command, "go to frame [FRAME]")
            .arg("FRAME", ArgumentDescriptor::number("1")),
        BlockDescriptor::new("nextFrame", BlockType::Command, "go to next frame"),
        BlockDescriptor::new("previousFrame", BlockType::Command, "go to previous frame"),
        BlockDescriptor::new("setPlayRate", BlockType::Command, "set play rate to [RATE] %")
            .arg("RATE", ArgumentDescriptor::number("100")),
        BlockDescriptor::new(
            "changePlayRateBy",
            BlockType::Command,
            "change play rate by [RATE]",
        )
        .arg("RATE", ArgumentDescriptor::number("10")),
        BlockDescriptor::new(
            "setEffectTo",
            BlockType::Command,
            "set [EFFECT] effect to [VALUE]",
        )
        .arg("EFFECT", ArgumentDescriptor::menu("effects", "ghost"))
        .arg("VALUE", ArgumentDescriptor::number("0")),
        BlockDescriptor::new(
            "changeEffectBy",
            BlockType::Command,
            "change [EFFECT] effect by [VALUE]",
        )
        .arg("EFFECT", ArgumentDescriptor::menu("effects", "ghost"))
        .arg("VALUE", ArgumentDescriptor::number("10")),
        BlockDescriptor::new("clearVideoEffects", BlockType::Command, "clear video effects"),
        BlockDescriptor::new("whenPlayedToEnd", BlockType::Hat, "when played to end"),
        BlockDescriptor::new(
            "whenPlayedToBeginning",
            BlockType::Hat,
            "when played to beginning",
        ),
        BlockDescriptor::new("whenReached", BlockType::Hat, "when reached [MARKER]")
            .arg("MARKER", ArgumentDescriptor::menu("markers", "0")),
        BlockDescriptor::new("whenTapped", BlockType::Hat, "when tapped"),
        BlockDescriptor::new("getCurrentFrame", BlockType::Reporter, "current frame"),
        BlockDescriptor::new("getTotalFrames", BlockType::Reporter, "total frames"),
        BlockDescriptor::new("getPlayRate", BlockType::Reporter, "play rate"),
        BlockDescriptor::new("isTapped", BlockType::Boolean, "tapped?"),
    ];

    let mut menus = HashMap::new();
    menus.insert("playDirection".to_string(), direction_menu);
    menus.insert("effects".to_string(), effects_menu);

    ExtensionInfo {
        id: "steinaVideo".to_string(),
        name: "Video".to_string(),
        blocks,
        menus,
    }
}

/// Palette for the audio extension.
pub fn audio_extension_info() -> ExtensionInfo {
    let blocks = vec![
        BlockDescriptor::new("playSound", BlockType::Command, "play sound until done"),
        BlockDescriptor::new(
            "playSoundFromAToB",
            BlockType::Command,
            "play sound from [A] to [B] until done",
        )
        .arg("A", ArgumentDescriptor::menu("markers", "0"))
        .arg("B", ArgumentDescriptor::menu("markers", "0")),
        BlockDescriptor::new("startSound", BlockType::Command, "start sound"),
        BlockDescriptor::new(
            "startSoundFromAToB",
            BlockType::Command,
            "start sound from [A] to [B]",
        )
        .arg("A", ArgumentDescriptor::menu("markers", "0"))
        .arg("B", ArgumentDescriptor::menu("markers", "0")),
        BlockDescriptor::new("setPlayRate", BlockType::Command, "set play rate to [RATE] %")
            .arg("RATE", ArgumentDescriptor::number("100")),
        BlockDescriptor::new(
            "changePlayRateBy",
            BlockType::Command,
            "change play rate by [RATE]",
        )
        .arg("RATE", ArgumentDescriptor::number("10")),
        BlockDescriptor::new("setVolumeTo", BlockType::Command, "set volume to [VOLUME] %")
            .arg("VOLUME", ArgumentDescriptor::number("100")),
        BlockDescriptor::new(
            "changeVolumeBy",
            BlockType::Command,
            "change volume by [VOLUME]",
        )
        .arg("VOLUME", ArgumentDescriptor::number("-10")),
        BlockDescriptor::new("getVolume", BlockType::Reporter, "volume"),
        BlockDescriptor::new("getPlayRate", BlockType::Reporter, "play rate"),
    ];

    ExtensionInfo {
        id: "steinaAudio".to_string(),
        name: "Audio".to_string(),
        blocks,
        menus: HashMap::new(),
    }
}
