use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five schedulable weekdays, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DaySlot {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl DaySlot {
    pub const ALL: [DaySlot; 5] = [
        DaySlot::Mon,
        DaySlot::Tue,
        DaySlot::Wed,
        DaySlot::Thu,
        DaySlot::Fri,
    ];

    /// Position within the week, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DaySlot::Mon => "Mon",
            DaySlot::Tue => "Tue",
            DaySlot::Wed => "Wed",
            DaySlot::Thu => "Thu",
            DaySlot::Fri => "Fri",
        }
    }
}

impl fmt::Display for DaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for DaySlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mon" | "monday" => Ok(DaySlot::Mon),
            "tue" | "tues" | "tuesday" => Ok(DaySlot::Tue),
            "wed" | "wednesday" => Ok(DaySlot::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Ok(DaySlot::Thu),
            "fri" | "friday" => Ok(DaySlot::Fri),
            _ => Err(format!(
                "Invalid day '{}'. Valid options: mon, tue, wed, thu, fri",
                s
            )),
        }
    }
}

/// The two duties of a day: morning drop-off and evening pick-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duty {
    Morning,
    Evening,
}

impl Duty {
    pub const ALL: [Duty; 2] = [Duty::Morning, Duty::Evening];
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duty::Morning => write!(f, "morning"),
            Duty::Evening => write!(f, "evening"),
        }
    }
}

impl FromStr for Duty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" | "am" | "dropoff" | "drop-off" => Ok(Duty::Morning),
            "evening" | "pm" | "pickup" | "pick-up" => Ok(Duty::Evening),
            _ => Err(format!(
                "Invalid duty '{}'. Valid options: morning, evening",
                s
            )),
        }
    }
}
