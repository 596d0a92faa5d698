//! Remote key vocabulary.
//!
//! Every key the device understands is a [`Key`] variant; parsing an unknown
//! name is an error rather than a command the device would silently ignore.

use std::fmt;
use std::str::FromStr;

/// Prefix shared by every wire identifier.
pub const KEYCODE_PREFIX: &str = "KEYCODE_";

macro_rules! keys {
    ($( $(#[$doc:meta])* $variant:ident => $wire:literal ),+ $(,)?) => {
        /// A key on the remote, rendered on the wire as `KEYCODE_<NAME>`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $( $(#[$doc])* $variant, )+
        }

        impl Key {
            /// Every key, in declaration order.
            pub const ALL: &'static [Key] = &[ $( Key::$variant, )+ ];

            /// The wire identifier, e.g. `KEYCODE_VOLUME_UP`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Key::$variant => $wire, )+
                }
            }
        }
    };
}

keys! {
    // ── Power & navigation ───────────────────────────────────────
    Power => "KEYCODE_POWER",
    Home => "KEYCODE_HOME",
    Back => "KEYCODE_BACK",
    Menu => "KEYCODE_MENU",
    Settings => "KEYCODE_SETTINGS",

    // ── D-pad ────────────────────────────────────────────────────
    DpadUp => "KEYCODE_DPAD_UP",
    DpadDown => "KEYCODE_DPAD_DOWN",
    DpadLeft => "KEYCODE_DPAD_LEFT",
    DpadRight => "KEYCODE_DPAD_RIGHT",
    /// Select / OK.
    DpadCenter => "KEYCODE_DPAD_CENTER",

    // ── Volume ───────────────────────────────────────────────────
    VolumeUp => "KEYCODE_VOLUME_UP",
    VolumeDown => "KEYCODE_VOLUME_DOWN",
    Mute => "KEYCODE_MUTE",

    // ── Media transport ──────────────────────────────────────────
    PlayPause => "KEYCODE_MEDIA_PLAY_PAUSE",
    Play => "KEYCODE_MEDIA_PLAY",
    Pause => "KEYCODE_MEDIA_PAUSE",
    Stop => "KEYCODE_MEDIA_STOP",
    Next => "KEYCODE_MEDIA_NEXT",
    Previous => "KEYCODE_MEDIA_PREVIOUS",
    FastForward => "KEYCODE_MEDIA_FAST_FORWARD",
    Rewind => "KEYCODE_MEDIA_REWIND",

    // ── Digits ───────────────────────────────────────────────────
    Num0 => "KEYCODE_0",
    Num1 => "KEYCODE_1",
    Num2 => "KEYCODE_2",
    Num3 => "KEYCODE_3",
    Num4 => "KEYCODE_4",
    Num5 => "KEYCODE_5",
    Num6 => "KEYCODE_6",
    Num7 => "KEYCODE_7",
    Num8 => "KEYCODE_8",
    Num9 => "KEYCODE_9",

    // ── TV ───────────────────────────────────────────────────────
    TvInput => "KEYCODE_TV_INPUT",
    ChannelUp => "KEYCODE_CHANNEL_UP",
    ChannelDown => "KEYCODE_CHANNEL_DOWN",
    Guide => "KEYCODE_GUIDE",
    Info => "KEYCODE_INFO",
    Del => "KEYCODE_DEL",
}

impl Key {
    /// Alias for [`Key::DpadCenter`].
    pub const OK: Key = Key::DpadCenter;

    /// Digit key for `0..=9`.
    pub fn digit(n: u8) -> Option<Key> {
        const DIGITS: [Key; 10] = [
            Key::Num0,
            Key::Num1,
            Key::Num2,
            Key::Num3,
            Key::Num4,
            Key::Num5,
            Key::Num6,
            Key::Num7,
            Key::Num8,
            Key::Num9,
        ];
        DIGITS.get(n as usize).copied()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key name that is not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    /// Accepts `KEYCODE_VOLUME_UP`, `VOLUME_UP` or `volume_up`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "OK" {
            return Ok(Key::OK);
        }
        let wire = if upper.starts_with(KEYCODE_PREFIX) {
            upper
        } else {
            format!("{KEYCODE_PREFIX}{upper}")
        };
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wire)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}
