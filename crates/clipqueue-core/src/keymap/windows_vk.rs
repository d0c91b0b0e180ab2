//! Windows Virtual Key (VK) code to key name table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).  VK codes range from
//! 0x00 to 0xFF.
//!
//! `VK_NAMES` is a compile-time constant array of 256 optional names indexed
//! by VK code.  The names are what display hints show and what the legacy
//! `"Ctrl+Alt+C"` hotkey form accepts (case-insensitively).  A handful of
//! alternative spellings are accepted on input through [`NAME_ALIASES`] but
//! never produced on output.

/// Returns the canonical name of `vk`, or `None` if the code has no name.
pub fn vk_to_name(vk: u16) -> Option<&'static str> {
    VK_NAMES.get(vk as usize).copied().flatten()
}

/// Looks up a VK code by key name, ignoring ASCII case.
///
/// Canonical names are checked first, then [`NAME_ALIASES`].
pub fn name_to_vk(name: &str) -> Option<u16> {
    // Linear scan is fine: lookups happen on config load, not per event.
    VK_NAMES
        .iter()
        .enumerate()
        .find_map(|(vk, entry)| match entry {
            Some(n) if n.eq_ignore_ascii_case(name) => Some(vk as u16),
            _ => None,
        })
        .or_else(|| {
            NAME_ALIASES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                .map(|&(_, vk)| vk)
        })
}

/// `true` for Shift, Ctrl, Alt and Win in their generic and sided forms.
pub fn is_modifier_vk(vk: u16) -> bool {
    matches!(vk, 0x10..=0x12 | 0x5B | 0x5C | 0xA0..=0xA5)
}

/// Input-only spellings.
const NAME_ALIASES: &[(&str, u16)] = &[
    ("Return", 0x0D),
    ("Escape", 0x1B),
    ("Control", 0x11),
    ("Menu", 0x12),
    ("Del", 0x2E),
    ("Ins", 0x2D),
    ("PgUp", 0x21),
    ("PgDn", 0x22),
    ("PrtSc", 0x2C),
    ("Tilde", 0xC0),
    ("Backquote", 0xC0),
    ("AudioVolumeMute", 0xAD),
    ("AudioVolumeDown", 0xAE),
    ("AudioVolumeUp", 0xAF),
];

/// Complete VK → name table indexed by VK code (0x00–0xFF).
///
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_NAMES: [Option<&str>; 256] = {
    let mut t: [Option<&str>; 256] = [None; 256];

    // ── Editing and navigation ────────────────────────────────────────────────
    t[0x08] = Some("Backspace");
    t[0x09] = Some("Tab");
    t[0x0C] = Some("Clear");
    t[0x0D] = Some("Enter");
    t[0x13] = Some("Pause");
    t[0x14] = Some("CapsLock");
    t[0x1B] = Some("Esc");
    t[0x20] = Some("Space");
    t[0x21] = Some("PageUp");
    t[0x22] = Some("PageDown");
    t[0x23] = Some("End");
    t[0x24] = Some("Home");
    t[0x25] = Some("Left");
    t[0x26] = Some("Up");
    t[0x27] = Some("Right");
    t[0x28] = Some("Down");
    t[0x2C] = Some("PrintScreen");
    t[0x2D] = Some("Insert");
    t[0x2E] = Some("Delete");

    // ── Digits (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────────
    t[0x30] = Some("0");
    t[0x31] = Some("1");
    t[0x32] = Some("2");
    t[0x33] = Some("3");
    t[0x34] = Some("4");
    t[0x35] = Some("5");
    t[0x36] = Some("6");
    t[0x37] = Some("7");
    t[0x38] = Some("8");
    t[0x39] = Some("9");

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = Some("A");
    t[0x42] = Some("B");
    t[0x43] = Some("C");
    t[0x44] = Some("D");
    t[0x45] = Some("E");
    t[0x46] = Some("F");
    t[0x47] = Some("G");
    t[0x48] = Some("H");
    t[0x49] = Some("I");
    t[0x4A] = Some("J");
    t[0x4B] = Some("K");
    t[0x4C] = Some("L");
    t[0x4D] = Some("M");
    t[0x4E] = Some("N");
    t[0x4F] = Some("O");
    t[0x50] = Some("P");
    t[0x51] = Some("Q");
    t[0x52] = Some("R");
    t[0x53] = Some("S");
    t[0x54] = Some("T");
    t[0x55] = Some("U");
    t[0x56] = Some("V");
    t[0x57] = Some("W");
    t[0x58] = Some("X");
    t[0x59] = Some("Y");
    t[0x5A] = Some("Z");

    // ── Windows / application keys ───────────────────────────────────────────
    t[0x5B] = Some("LWin");
    t[0x5C] = Some("RWin");
    t[0x5D] = Some("Apps");
    t[0x5F] = Some("Sleep");

    // ── Numpad ────────────────────────────────────────────────────────────────
    t[0x60] = Some("Num0");
    t[0x61] = Some("Num1");
    t[0x62] = Some("Num2");
    t[0x63] = Some("Num3");
    t[0x64] = Some("Num4");
    t[0x65] = Some("Num5");
    t[0x66] = Some("Num6");
    t[0x67] = Some("Num7");
    t[0x68] = Some("Num8");
    t[0x69] = Some("Num9");
    t[0x6A] = Some("NumMultiply");
    t[0x6B] = Some("NumAdd");
    t[0x6C] = Some("NumSeparator");
    t[0x6D] = Some("NumSubtract");
    t[0x6E] = Some("NumDecimal");
    t[0x6F] = Some("NumDivide");

    // ── Function keys (VK_F1=0x70 … VK_F24=0x87) ─────────────────────────────
    t[0x70] = Some("F1");
    t[0x71] = Some("F2");
    t[0x72] = Some("F3");
    t[0x73] = Some("F4");
    t[0x74] = Some("F5");
    t[0x75] = Some("F6");
    t[0x76] = Some("F7");
    t[0x77] = Some("F8");
    t[0x78] = Some("F9");
    t[0x79] = Some("F10");
    t[0x7A] = Some("F11");
    t[0x7B] = Some("F12");
    t[0x7C] = Some("F13");
    t[0x7D] = Some("F14");
    t[0x7E] = Some("F15");
    t[0x7F] = Some("F16");
    t[0x80] = Some("F17");
    t[0x81] = Some("F18");
    t[0x82] = Some("F19");
    t[0x83] = Some("F20");
    t[0x84] = Some("F21");
    t[0x85] = Some("F22");
    t[0x86] = Some("F23");
    t[0x87] = Some("F24");

    t[0x90] = Some("NumLock");
    t[0x91] = Some("ScrollLock");

    // ── Modifiers ─────────────────────────────────────────────────────────────
    // Generic forms come before the sided ones so lookups by "Shift" etc. hit
    // the generic VK; hotkey parsing treats those words as modifiers anyway.
    t[0x10] = Some("Shift");
    t[0x11] = Some("Ctrl");
    t[0x12] = Some("Alt");
    t[0xA0] = Some("LShift");
    t[0xA1] = Some("RShift");
    t[0xA2] = Some("LCtrl");
    t[0xA3] = Some("RCtrl");
    t[0xA4] = Some("LAlt");
    t[0xA5] = Some("RAlt");

    // ── Browser, media and launch keys ───────────────────────────────────────
    t[0xA6] = Some("BrowserBack");
    t[0xA7] = Some("BrowserForward");
    t[0xA8] = Some("BrowserRefresh");
    t[0xA9] = Some("BrowserStop");
    t[0xAA] = Some("BrowserSearch");
    t[0xAB] = Some("BrowserFavorites");
    t[0xAC] = Some("BrowserHome");
    t[0xAD] = Some("VolumeMute");
    t[0xAE] = Some("VolumeDown");
    t[0xAF] = Some("VolumeUp");
    t[0xB0] = Some("MediaNextTrack");
    t[0xB1] = Some("MediaPrevTrack");
    t[0xB2] = Some("MediaStop");
    t[0xB3] = Some("MediaPlayPause");
    t[0xB4] = Some("LaunchMail");
    t[0xB5] = Some("LaunchMediaSelect");
    t[0xB6] = Some("LaunchApp1");
    t[0xB7] = Some("LaunchApp2");

    // ── OEM punctuation (US layout) ───────────────────────────────────────────
    t[0xBA] = Some("Semicolon");
    t[0xBB] = Some("Equals");
    t[0xBC] = Some("Comma");
    t[0xBD] = Some("Minus");
    t[0xBE] = Some("Period");
    t[0xBF] = Some("Slash");
    t[0xC0] = Some("Grave");
    t[0xDB] = Some("LeftBracket");
    t[0xDC] = Some("Backslash");
    t[0xDD] = Some("RightBracket");
    t[0xDE] = Some("Quote");
    t[0xE2] = Some("IntlBackslash");

    t
};
