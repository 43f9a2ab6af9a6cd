use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Clock system prescaler setting (DIVM / DIVS / DIVA style fields).
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClockDivider {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
}

impl ClockDivider {
    /// The four settings shared by every clock line of the CS module.
    pub const BASIC: [ClockDivider; 4] = [
        ClockDivider::Div1,
        ClockDivider::Div2,
        ClockDivider::Div4,
        ClockDivider::Div8,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            ClockDivider::Div1 => "DIV1",
            ClockDivider::Div2 => "DIV2",
            ClockDivider::Div4 => "DIV4",
            ClockDivider::Div8 => "DIV8",
            ClockDivider::Div16 => "DIV16",
            ClockDivider::Div32 => "DIV32",
        }
    }

    pub const fn divisor(&self) -> u32 {
        match self {
            ClockDivider::Div1 => 1,
            ClockDivider::Div2 => 2,
            ClockDivider::Div4 => 4,
            ClockDivider::Div8 => 8,
            ClockDivider::Div16 => 16,
            ClockDivider::Div32 => 32,
        }
    }
}

impl fmt::Display for ClockDivider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Watchdog interval select (WDTIS). The timer expires after `divisor()`
/// ticks of the effective clock.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimerDivider {
    Pow6,
    Pow9,
    Pow13,
    Pow15,
    Pow19,
    Pow23,
    Pow27,
    Pow31,
}

impl TimerDivider {
    /// Every interval the WDT_A can select, shortest first.
    pub const ALL: [TimerDivider; 8] = [
        TimerDivider::Pow6,
        TimerDivider::Pow9,
        TimerDivider::Pow13,
        TimerDivider::Pow15,
        TimerDivider::Pow19,
        TimerDivider::Pow23,
        TimerDivider::Pow27,
        TimerDivider::Pow31,
    ];

    pub const fn exponent(&self) -> u32 {
        match self {
            TimerDivider::Pow6 => 6,
            TimerDivider::Pow9 => 9,
            TimerDivider::Pow13 => 13,
            TimerDivider::Pow15 => 15,
            TimerDivider::Pow19 => 19,
            TimerDivider::Pow23 => 23,
            TimerDivider::Pow27 => 27,
            TimerDivider::Pow31 => 31,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            TimerDivider::Pow6 => "2^6",
            TimerDivider::Pow9 => "2^9",
            TimerDivider::Pow13 => "2^13",
            TimerDivider::Pow15 => "2^15",
            TimerDivider::Pow19 => "2^19",
            TimerDivider::Pow23 => "2^23",
            TimerDivider::Pow27 => "2^27",
            TimerDivider::Pow31 => "2^31",
        }
    }

    pub const fn divisor(&self) -> u64 {
        1 << self.exponent()
    }
}

impl fmt::Display for TimerDivider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::{Serialize, Serializer};

    use super::{ClockDivider, TimerDivider};

    // Dividers are shown to users by label, so that is what gets serialized.
    impl Serialize for ClockDivider {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.label())
        }
    }

    impl Serialize for TimerDivider {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.label())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_divisors_match_labels() {
        assert_eq!(TimerDivider::Pow6.divisor(), 64);
        assert_eq!(TimerDivider::Pow15.divisor(), 32_768);
        assert_eq!(TimerDivider::Pow31.divisor(), 2_147_483_648);
        for divider in TimerDivider::ALL {
            let exponent: u32 = divider.label()[2..].parse().unwrap();
            assert_eq!(divider.divisor(), 1u64 << exponent);
        }
    }

    #[test]
    fn timer_dividers_ascend() {
        assert!(TimerDivider::ALL.windows(2).all(|w| w[0].divisor() < w[1].divisor()));
    }

    #[test]
    fn clock_divider_labels() {
        assert_eq!(ClockDivider::Div8.to_string(), "DIV8");
        assert_eq!(ClockDivider::Div32.divisor(), 32);
        let product: u32 = ClockDivider::BASIC.iter().map(ClockDivider::divisor).product();
        assert_eq!(product, 64);
    }
}
