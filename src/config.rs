//! Gesture configuration.

use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

/// Config location used when no config directory can be determined.
const FALLBACK_CONFIG_DIR: &str = "/home/root/.config";

/// Finger count for blocks without a `fingers` key.
const DEFAULT_FINGERS: usize = 3;

/// Kind of touch gesture.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum GestureKind {
    /// All fingers touching down at the same time.
    Tap,
}

impl FromStr for GestureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tap" => Ok(Self::Tap),
            _ => Err(format!("Got {s:?}, expected tap")),
        }
    }
}

impl Display for GestureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tap => write!(f, "tap"),
        }
    }
}

/// User-defined gesture action.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct GestureDefinition {
    pub kind: GestureKind,
    pub fingers: usize,
    pub command: String,

    /// Settle pause override after the command was launched.
    pub duration: Option<Duration>,
}

impl Display for GestureDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-finger {}: {}", self.fingers, self.kind, self.command)
    }
}

/// Default gesture configuration path.
pub fn default_path() -> PathBuf {
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR));
    config_dir.join("genie_lamp").join("gestures.conf")
}

/// Load gestures from a configuration file.
pub fn load(path: &Path) -> io::Result<Vec<GestureDefinition>> {
    let content = fs::read_to_string(path)?;
    Ok(parse(content.lines()))
}

/// Parse gesture definitions from `key=value` blocks.
///
/// Blocks are separated by empty lines; each one complete with both a gesture
/// kind and a command produces a definition. Anything else is skipped.
pub fn parse<I, S>(lines: I) -> Vec<GestureDefinition>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut gestures = Vec::new();
    let mut block = Block::default();

    for line in lines {
        let line = line.as_ref().trim();

        if line.is_empty() {
            gestures.extend(block.finish());
            block = Block::default();
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            block.set(key.trim(), value.trim());
        }
    }
    gestures.extend(block.finish());

    gestures
}

/// Partially parsed gesture block.
#[derive(Default, Debug)]
struct Block {
    kind: String,
    fingers: Option<String>,
    command: String,
    duration: Option<Duration>,
}

impl Block {
    /// Apply a single `key=value` pair.
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "gesture" => self.kind = value.into(),
            "command" => self.command = value.into(),
            "fingers" => self.fingers = Some(value.into()),
            "duration" => {
                if let Ok(millis) = value.parse::<u64>() {
                    self.duration = Some(Duration::from_millis(millis));
                }
            },
            _ => (),
        }
    }

    /// Convert the block into a gesture, if it is complete.
    fn finish(self) -> Option<GestureDefinition> {
        if self.kind.is_empty() || self.command.is_empty() {
            return None;
        }

        let kind = match GestureKind::from_str(&self.kind) {
            Ok(kind) => kind,
            Err(err) => {
                debug!("Skipping gesture block: {err}");
                return None;
            },
        };

        let fingers = match self.fingers.as_deref().map(str::parse::<usize>) {
            None => DEFAULT_FINGERS,
            Some(Ok(fingers)) if fingers > 0 => fingers,
            Some(_) => {
                debug!("Skipping gesture block: invalid finger count {:?}", self.fingers);
                return None;
            },
        };

        Some(GestureDefinition { kind, fingers, command: self.command, duration: self.duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block() {
        let gestures = parse("gesture=tap\nfingers=3\ncommand=echo hi\n".lines());
        assert_eq!(gestures, vec![GestureDefinition {
            kind: GestureKind::Tap,
            fingers: 3,
            command: "echo hi".into(),
            duration: None,
        }]);

        // Same block with a trailing separator.
        let gestures = parse("gesture=tap\nfingers=3\ncommand=echo hi\n\n".lines());
        assert_eq!(gestures.len(), 1);
    }

    #[test]
    fn multiple_blocks_in_order() {
        let config = "\
# Undo.
gesture=tap
fingers=2
command=/opt/bin/undo

gesture=tap
fingers=4
command=echo 'pen down 500 500' | /opt/bin/lamp
duration=1000


gesture = tap
fingers = 5
command = a=b
";
        let gestures = parse(config.lines());
        assert_eq!(gestures.len(), 3);

        assert_eq!(gestures[0].fingers, 2);
        assert_eq!(gestures[0].command, "/opt/bin/undo");
        assert_eq!(gestures[0].duration, None);

        assert_eq!(gestures[1].fingers, 4);
        assert_eq!(gestures[1].command, "echo 'pen down 500 500' | /opt/bin/lamp");
        assert_eq!(gestures[1].duration, Some(Duration::from_millis(1000)));

        assert_eq!(gestures[2].fingers, 5);
        assert_eq!(gestures[2].command, "a=b");
    }

    #[test]
    fn incomplete_blocks() {
        let config = "\
gesture=tap
fingers=3

fingers=2
command=echo no kind

gesture=tap
command=
";
        assert!(parse(config.lines()).is_empty());
    }

    #[test]
    fn unsupported_kind() {
        let config = "gesture=swipe\nfingers=2\ncommand=true\n\ngesture=TAP\ncommand=true";
        let gestures = parse(config.lines());
        assert_eq!(gestures.len(), 1);
        assert_eq!(gestures[0].kind, GestureKind::Tap);
    }

    #[test]
    fn malformed_lines() {
        let config = "\
gesture=tap
this line has no separator
duration=soon
command=true
";
        let gestures = parse(config.lines());
        assert_eq!(gestures.len(), 1);
        assert_eq!(gestures[0].fingers, DEFAULT_FINGERS);
        assert_eq!(gestures[0].duration, None);
    }

    #[test]
    fn invalid_finger_count() {
        let config = "\
gesture=tap
fingers=0
command=true

gesture=tap
fingers=three
command=true

gesture=tap
fingers=-2
command=true

gesture=tap
fingers=2
command=true
";
        let gestures = parse(config.lines());
        assert_eq!(gestures.len(), 1);
        assert_eq!(gestures[0].fingers, 2);
    }

    #[test]
    fn comments_only() {
        let config = "# Nothing here.\n\n   \n# gesture=tap\n# command=true\n";
        assert!(parse(config.lines()).is_empty());
        assert!(parse(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn last_value_wins() {
        let gestures = parse(["gesture=tap", "command=first", "command=second", "fingers=1"]);
        assert_eq!(gestures.len(), 1);
        assert_eq!(gestures[0].command, "second");
        assert_eq!(gestures[0].fingers, 1);
    }

    #[test]
    fn load_file() {
        let path = std::env::temp_dir().join(format!("genie_lamp-{}.conf", std::process::id()));
        fs::write(&path, "gesture=tap\nfingers=3\ncommand=echo hi\n").unwrap();
        let gestures = load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(gestures.len(), 1);
        assert_eq!(gestures[0].to_string(), "3-finger tap: echo hi");

        assert!(load(&path).is_err());
    }
}
