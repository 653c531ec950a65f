// Tooltip composition for a hovered sample
use crate::domain::chart::{Arrow, ChannelTooltip, Tooltip};
use crate::domain::extent::LinearScale;
use crate::domain::gaussian::{gaussian_curve, GAUSSIAN_STEPS};
use crate::domain::sample::{Channel, ChannelSample};

/// Width of the distribution glyph in pixels
const DISTRIBUTION_WIDTH: f64 = 130.0;
/// Degrees added on both sides of the hovered temperatures
const DISTRIBUTION_MARGIN: f64 = 1.0;
/// The published std is halved before drawing
const STD_SCALE: f64 = 0.5;

const ARROW_ORIGIN_Y: f64 = 60.0;
const ARROW_LENGTH: f64 = 25.0;
const ARROW_RISE_PER_UNIT: f64 = 3.0;

fn arrow_origin_x(channel: Channel) -> f64 {
    match channel {
        Channel::Male => 15.0,
        Channel::Female => 60.0,
    }
}

pub fn compose_tooltip(sample: &ChannelSample) -> Tooltip {
    let low = sample.female.temperature.min(sample.male.temperature) - DISTRIBUTION_MARGIN;
    let high = sample.female.temperature.max(sample.male.temperature) + DISTRIBUTION_MARGIN;
    let scale = LinearScale::new((low, high), (0.0, DISTRIBUTION_WIDTH));

    let channels = Channel::ALL
        .into_iter()
        .map(|channel| {
            let reading = sample.reading(channel);
            let x1 = arrow_origin_x(channel);

            let curve = match gaussian_curve(
                reading.temperature,
                reading.std_dev * STD_SCALE,
                |v| scale.apply(v),
                GAUSSIAN_STEPS,
            ) {
                Ok(points) => Some(points),
                Err(e) => {
                    tracing::warn!("Skipping {:?} curve at {}: {}", channel, sample.time, e);
                    None
                }
            };

            ChannelTooltip {
                channel,
                temperature: reading.temperature,
                activity_change: reading.activity_change,
                tick_x: scale.apply(reading.temperature),
                activity_arrow: Arrow {
                    x1,
                    y1: ARROW_ORIGIN_Y,
                    x2: x1 + ARROW_LENGTH,
                    y2: ARROW_ORIGIN_Y - reading.activity_change * ARROW_RISE_PER_UNIT,
                },
                curve,
            }
        })
        .collect();

    Tooltip {
        time: sample.time,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::tests::{channel_sample, hm};

    #[test]
    fn test_compose_tooltip_geometry() {
        let mut sample = channel_sample("12:30", 37.0, 36.0);
        sample.female.activity_change = 2.0;
        sample.male.activity_change = -1.0;

        let tooltip = compose_tooltip(&sample);
        assert_eq!(tooltip.time, hm("12:30"));
        assert_eq!(tooltip.channels.len(), 2);

        // Scale runs from 35.0 to 38.0 over 130 pixels
        let female = &tooltip.channels[0];
        assert_eq!(female.channel, Channel::Female);
        assert!((female.tick_x - 130.0 * 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(female.activity_arrow, Arrow { x1: 60.0, y1: 60.0, x2: 85.0, y2: 54.0 });

        let male = &tooltip.channels[1];
        assert!((male.tick_x - 130.0 / 3.0).abs() < 1e-9);
        assert_eq!(male.activity_arrow, Arrow { x1: 15.0, y1: 60.0, x2: 40.0, y2: 63.0 });
        assert_eq!(male.curve.as_ref().map(Vec::len), Some(GAUSSIAN_STEPS + 1));
    }

    #[test]
    fn test_zero_std_drops_only_that_curve() {
        let mut sample = channel_sample("12:30", 37.0, 36.0);
        sample.male.std_dev = 0.0;

        let tooltip = compose_tooltip(&sample);
        assert!(tooltip.channels[0].curve.is_some());
        assert!(tooltip.channels[1].curve.is_none());
    }
}
