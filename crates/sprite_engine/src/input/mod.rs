//! Input events
//!
//! Platform shells translate native window and DOM events into
//! [`InputEvent`]s; the engine forwards them to the game before each update.

use bitflags::bitflags;

/// What happened to a key or the mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Key or button went down
    Press,
    /// Key or button went up
    Release,
    /// Key auto-repeat
    Repeat,
    /// Pointer moved
    Move,
}

bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Either shift key
        const SHIFT = 1;
        /// Either control key
        const CONTROL = 1 << 1;
        /// Either alt / option key
        const ALT = 1 << 2;
        /// Either super / command / windows key
        const SUPER = 1 << 3;
    }
}

macro_rules! keys {
    ($($name:ident => $glfw:ident, $code:literal;)*) => {
        /// Physical keys, named after the US layout
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $(
                #[doc = concat!("The `", stringify!($name), "` key")]
                $name,
            )*
            /// A key without a mapping
            Unknown,
        }

        impl Key {
            /// Map a DOM `KeyboardEvent.code` value
            pub fn from_code(code: &str) -> Self {
                match code {
                    $($code => Self::$name,)*
                    _ => Self::Unknown,
                }
            }
        }

        #[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
        impl From<glfw::Key> for Key {
            fn from(key: glfw::Key) -> Self {
                match key {
                    $(glfw::Key::$glfw => Self::$name,)*
                    _ => Self::Unknown,
                }
            }
        }
    };
}

keys! {
    A => A, "KeyA";
    B => B, "KeyB";
    C => C, "KeyC";
    D => D, "KeyD";
    E => E, "KeyE";
    F => F, "KeyF";
    G => G, "KeyG";
    H => H, "KeyH";
    I => I, "KeyI";
    J => J, "KeyJ";
    K => K, "KeyK";
    L => L, "KeyL";
    M => M, "KeyM";
    N => N, "KeyN";
    O => O, "KeyO";
    P => P, "KeyP";
    Q => Q, "KeyQ";
    R => R, "KeyR";
    S => S, "KeyS";
    T => T, "KeyT";
    U => U, "KeyU";
    V => V, "KeyV";
    W => W, "KeyW";
    X => X, "KeyX";
    Y => Y, "KeyY";
    Z => Z, "KeyZ";
    Zero => Num0, "Digit0";
    One => Num1, "Digit1";
    Two => Num2, "Digit2";
    Three => Num3, "Digit3";
    Four => Num4, "Digit4";
    Five => Num5, "Digit5";
    Six => Num6, "Digit6";
    Seven => Num7, "Digit7";
    Eight => Num8, "Digit8";
    Nine => Num9, "Digit9";
    F1 => F1, "F1";
    F2 => F2, "F2";
    F3 => F3, "F3";
    F4 => F4, "F4";
    F5 => F5, "F5";
    F6 => F6, "F6";
    F7 => F7, "F7";
    F8 => F8, "F8";
    F9 => F9, "F9";
    F10 => F10, "F10";
    F11 => F11, "F11";
    F12 => F12, "F12";
    Dash => Minus, "Minus";
    Apostrophe => Apostrophe, "Quote";
    Semicolon => Semicolon, "Semicolon";
    Equals => Equal, "Equal";
    Comma => Comma, "Comma";
    Period => Period, "Period";
    Slash => Slash, "Slash";
    Backslash => Backslash, "Backslash";
    LeftBracket => LeftBracket, "BracketLeft";
    RightBracket => RightBracket, "BracketRight";
    Backspace => Backspace, "Backspace";
    Tab => Tab, "Tab";
    CapsLock => CapsLock, "CapsLock";
    Space => Space, "Space";
    Enter => Enter, "Enter";
    Escape => Escape, "Escape";
    Insert => Insert, "Insert";
    PrintScreen => PrintScreen, "PrintScreen";
    Delete => Delete, "Delete";
    PageUp => PageUp, "PageUp";
    PageDown => PageDown, "PageDown";
    Home => Home, "Home";
    End => End, "End";
    Pause => Pause, "Pause";
    ScrollLock => ScrollLock, "ScrollLock";
    ArrowLeft => Left, "ArrowLeft";
    ArrowRight => Right, "ArrowRight";
    ArrowDown => Down, "ArrowDown";
    ArrowUp => Up, "ArrowUp";
    LeftShift => LeftShift, "ShiftLeft";
    LeftControl => LeftControl, "ControlLeft";
    LeftAlt => LeftAlt, "AltLeft";
    LeftSuper => LeftSuper, "MetaLeft";
    RightShift => RightShift, "ShiftRight";
    RightControl => RightControl, "ControlRight";
    RightAlt => RightAlt, "AltRight";
    RightSuper => RightSuper, "MetaRight";
    NumLock => NumLock, "NumLock";
    NumMultiply => KpMultiply, "NumpadMultiply";
    NumDivide => KpDivide, "NumpadDivide";
    NumAdd => KpAdd, "NumpadAdd";
    NumSubtract => KpSubtract, "NumpadSubtract";
    NumDecimal => KpDecimal, "NumpadDecimal";
    NumEnter => KpEnter, "NumpadEnter";
    NumZero => Kp0, "Numpad0";
    NumOne => Kp1, "Numpad1";
    NumTwo => Kp2, "Numpad2";
    NumThree => Kp3, "Numpad3";
    NumFour => Kp4, "Numpad4";
    NumFive => Kp5, "Numpad5";
    NumSix => Kp6, "Numpad6";
    NumSeven => Kp7, "Numpad7";
    NumEight => Kp8, "Numpad8";
    NumNine => Kp9, "Numpad9";
}

#[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
impl From<glfw::Modifiers> for Modifiers {
    fn from(mods: glfw::Modifiers) -> Self {
        let mut out = Self::empty();
        out.set(Self::SHIFT, mods.contains(glfw::Modifiers::Shift));
        out.set(Self::CONTROL, mods.contains(glfw::Modifiers::Control));
        out.set(Self::ALT, mods.contains(glfw::Modifiers::Alt));
        out.set(Self::SUPER, mods.contains(glfw::Modifiers::Super));
        out
    }
}

#[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
impl From<glfw::Action> for Action {
    fn from(action: glfw::Action) -> Self {
        match action {
            glfw::Action::Press => Self::Press,
            glfw::Action::Release => Self::Release,
            glfw::Action::Repeat => Self::Repeat,
        }
    }
}

/// An input or window event, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// The drawable area changed size
    Resize {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// A key changed state
    Key {
        /// Physical key
        key: Key,
        /// Held modifiers
        modifiers: Modifiers,
        /// Press, release or repeat
        action: Action,
    },
    /// The pointer moved or a button changed state
    Mouse {
        /// Pointer x
        x: f32,
        /// Pointer y
        y: f32,
        /// Press, release or move
        action: Action,
    },
    /// Vertical wheel movement
    Scroll(f32),
    /// A character was typed
    Type(char),
}

/// Map a DOM `WheelEvent.deltaY` to a GLFW-style scroll step
///
/// DOM deltas grow downwards and come in pixels, lines or pages, so only the
/// direction is kept. Horizontal-only gestures report no vertical scroll.
pub fn wheel_scroll(delta_y: f64) -> Option<f32> {
    if delta_y < 0.0 {
        Some(1.0)
    } else if delta_y > 0.0 {
        Some(-1.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_codes() {
        assert_eq!(Key::from_code("KeyA"), Key::A);
        assert_eq!(Key::from_code("Digit7"), Key::Seven);
        assert_eq!(Key::from_code("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_code("NumpadEnter"), Key::NumEnter);
        assert_eq!(Key::from_code("Lang1"), Key::Unknown);
    }

    #[test]
    fn test_modifier_bits() {
        let mods = Modifiers::SHIFT | Modifiers::SUPER;
        assert_eq!(mods.bits(), 0b1001);
        assert!(!mods.contains(Modifiers::CONTROL));
    }

    #[test]
    fn test_wheel_scroll_direction() {
        assert_eq!(wheel_scroll(-120.0), Some(1.0));
        assert_eq!(wheel_scroll(3.0), Some(-1.0));
        assert_eq!(wheel_scroll(0.0), None);
        assert_eq!(wheel_scroll(-0.0), None);
        assert_eq!(wheel_scroll(f64::NAN), None);
    }

    #[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
    #[test]
    fn test_glfw_mapping() {
        assert_eq!(Key::from(glfw::Key::Space), Key::Space);
        assert_eq!(Key::from(glfw::Key::Kp3), Key::NumThree);
        assert_eq!(Key::from(glfw::Key::F25), Key::Unknown);
        assert_eq!(
            Modifiers::from(glfw::Modifiers::Control | glfw::Modifiers::Alt),
            Modifiers::CONTROL | Modifiers::ALT
        );
        assert_eq!(Action::from(glfw::Action::Repeat), Action::Repeat);
    }
}
