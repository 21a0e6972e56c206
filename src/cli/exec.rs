use std::str::FromStr;

use eyre::Result;
use strum::{EnumString, VariantNames};
use thiserror::Error;

use crate::{
    misc::StatusDot,
    panel::{ControlPanel, PanelError},
    plc::DeviceState,
};

/// One operator action, as typed on the command line or in the panel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Power(bool),
    Speed(u32),
    Stop,
}

#[derive(Copy, Clone, Debug, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum Keyword {
    On,
    Off,
    Speed,
    Stop,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseStepError {
    #[error("Unknown step \"{0}\", expected one of {expected:?}", expected = Keyword::VARIANTS)]
    Unknown(String),

    #[error("Speed needs a value, e.g. speed=1500")]
    MissingSpeed,

    #[error("Invalid speed \"{0}\"")]
    InvalidSpeed(String),

    #[error("Unexpected argument \"{0}\"")]
    Trailing(String),
}

impl FromStr for Step {
    type Err = ParseStepError;

    /// Accepts `speed=1500` as well as `speed 1500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split(['=', ' ']).filter(|w| !w.is_empty());

        let word = words.next().unwrap_or_default();
        let keyword =
            Keyword::from_str(&word.to_lowercase()).map_err(|_| ParseStepError::Unknown(word.into()))?;

        let step = match keyword {
            Keyword::On => Step::Power(true),
            Keyword::Off => Step::Power(false),
            Keyword::Stop => Step::Stop,
            Keyword::Speed => {
                let value = words.next().ok_or(ParseStepError::MissingSpeed)?;
                let speed = value
                    .parse()
                    .map_err(|_| ParseStepError::InvalidSpeed(value.into()))?;

                Step::Speed(speed)
            }
        };

        match words.next() {
            Some(extra) => Err(ParseStepError::Trailing(extra.into())),
            None => Ok(step),
        }
    }
}

impl Step {
    pub async fn apply(self, panel: &mut ControlPanel) -> Result<DeviceState, PanelError> {
        match self {
            Step::Power(on) => panel.set_power(on).await,
            Step::Speed(speed) => panel.set_speed(speed).await,
            Step::Stop => panel.emergency_stop().await,
        }
    }
}

/// Runs the steps in order and stops at the first one that fails.
pub async fn run(panel: &mut ControlPanel, steps: &[Step]) -> Result<()> {
    for step in steps {
        tracing::debug!("Executing {step:?}");

        let state = step.apply(panel).await?;
        println!("{:#}, speed {}", StatusDot::from(state), state.speed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!("on".parse(), Ok(Step::Power(true)));
        assert_eq!("OFF".parse(), Ok(Step::Power(false)));
        assert_eq!("stop".parse(), Ok(Step::Stop));
        assert_eq!("speed=1500".parse(), Ok(Step::Speed(1500)));
        assert_eq!("speed 300".parse(), Ok(Step::Speed(300)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "fast".parse::<Step>(),
            Err(ParseStepError::Unknown("fast".into()))
        );
        assert_eq!("speed".parse::<Step>(), Err(ParseStepError::MissingSpeed));
        assert_eq!(
            "speed=-5".parse::<Step>(),
            Err(ParseStepError::InvalidSpeed("-5".into()))
        );
        assert_eq!(
            "on now".parse::<Step>(),
            Err(ParseStepError::Trailing("now".into()))
        );
        assert_eq!("".parse::<Step>(), Err(ParseStepError::Unknown("".into())));
    }
}
