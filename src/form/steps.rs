use serde::{Deserialize, Serialize};

/// Steps of the property form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStep {
    GeneralInfo,
    Location,
    Features,
    Areas,
}

impl FormStep {
    pub const ALL: [FormStep; 4] = [
        FormStep::GeneralInfo,
        FormStep::Location,
        FormStep::Features,
        FormStep::Areas,
    ];

    pub fn index(self) -> usize {
        match self {
            FormStep::GeneralInfo => 0,
            FormStep::Location => 1,
            FormStep::Features => 2,
            FormStep::Areas => 3,
        }
    }

    /// Step at `index`, clamped into the valid range
    pub fn clamped(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn title(self) -> &'static str {
        match self {
            FormStep::GeneralInfo => "General information",
            FormStep::Location => "Location",
            FormStep::Features => "Features",
            FormStep::Areas => "Areas",
        }
    }

    pub fn is_last(self) -> bool {
        self.index() == Self::ALL.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping() {
        assert_eq!(FormStep::clamped(0), FormStep::GeneralInfo);
        assert_eq!(FormStep::clamped(3), FormStep::Areas);
        assert_eq!(FormStep::clamped(42), FormStep::Areas);
        for step in FormStep::ALL {
            assert_eq!(FormStep::clamped(step.index()), step);
        }
    }
}
