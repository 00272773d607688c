/// Margin kept around the content on the standard output profiles.
pub const STICKER_MARGIN: u32 = 10;

/// Margin for the chat-tab icon. The tab canvas is tiny; the standard
/// margin would eat a third of it.
pub const TAB_MARGIN: u32 = 2;

/// Delay between animation frames, in milliseconds.
pub const ANIMATION_FRAME_DELAY_MS: u16 = 300;

/// Upper bound on animation frame counts accepted by the platform.
pub const MAX_ANIMATION_FRAMES: usize = 20;

/// Named output size profiles for the sticker platform.
///
/// Each profile carries the platform's maximum canvas size and the margin
/// that must surround the content. Canvas dimensions are forced even
/// (platform requirement); an odd configured dimension is decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeProfile {
    /// Pack icon, 240x240.
    Main,
    /// Chat sticker, up to 370x320.
    Sticker,
    /// Animated sticker frame, up to 320x270.
    AnimationFrame,
    /// Sticker-picker tab icon, 96x74.
    Tab,
}

impl SizeProfile {
    pub const fn max_width(self) -> u32 {
        match self {
            Self::Main => 240,
            Self::Sticker => 370,
            Self::AnimationFrame => 320,
            Self::Tab => 96,
        }
    }

    pub const fn max_height(self) -> u32 {
        match self {
            Self::Main => 240,
            Self::Sticker => 320,
            Self::AnimationFrame => 270,
            Self::Tab => 74,
        }
    }

    pub const fn margin(self) -> u32 {
        match self {
            Self::Tab => TAB_MARGIN,
            _ => STICKER_MARGIN,
        }
    }

    /// Final canvas dimensions: the profile maximum, even-adjusted.
    pub const fn canvas_size(self) -> (u32, u32) {
        (even(self.max_width()), even(self.max_height()))
    }

    /// Display label for the profile.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Main => "Main Image / メイン画像 (240x240)",
            Self::Sticker => "Sticker Image / スタンプ画像 (Max 370x320)",
            Self::AnimationFrame => "Animation Sticker / アニメーションスタンプ (Max 320x270)",
            Self::Tab => "Chat Tab Image / トークルームタブ画像 (96x74)",
        }
    }
}

const fn even(value: u32) -> u32 {
    if value % 2 == 0 {
        value
    } else {
        value - 1
    }
}
