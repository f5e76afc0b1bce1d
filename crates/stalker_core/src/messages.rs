//! Boundary parsing for string-encoded collaborator messages.
//!
//! Hosts that speak in delimited strings (map scripts, console commands)
//! convert them here. Nothing inside the controller handles strings; a
//! message that fails to parse is rejected before it reaches the agent.

use crate::combat::PatternOrder;
use crate::error::{AgentError, Result};
use crate::math::Vec3;
use crate::path::PathReply;
use crate::time::{ms_from_secs, TimeMs};

/// Path service tokens meaning "no route".
const NO_PATH_SENTINELS: [&str; 3] = ["-2", "-1", "0"];

/// Parse a flattened coordinate list (`"x y z x y z ..."`).
///
/// Numbers may be separated by whitespace or commas.
pub fn parse_vectors(input: &str) -> Result<Vec<Vec3>> {
    let numbers = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| AgentError::malformed(input, format!("bad number '{token}'")))
        })
        .collect::<Result<Vec<f64>>>()?;

    if numbers.len() % 3 != 0 {
        return Err(AgentError::malformed(
            input,
            format!("{} numbers is not a whole number of vectors", numbers.len()),
        ));
    }

    Ok(numbers
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

/// Parse a path service reply.
pub fn parse_path_reply(input: &str) -> Result<PathReply> {
    let trimmed = input.trim();
    if NO_PATH_SENTINELS.contains(&trimmed) {
        return Ok(PathReply::NoPath);
    }
    parse_vectors(trimmed).map(PathReply::Waypoints)
}

/// Parse a pattern order name.
pub fn parse_pattern_order(input: &str) -> Result<PatternOrder> {
    match input.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(PatternOrder::None),
        "hold" => Ok(PatternOrder::Hold),
        "patrol" => Ok(PatternOrder::Patrol),
        other => Err(AgentError::malformed(
            input,
            format!("unknown pattern order '{other}'"),
        )),
    }
}

/// Parse a parry pre-arm duration given in seconds.
pub fn parse_duration_secs(input: &str) -> Result<TimeMs> {
    let secs: f64 = input
        .trim()
        .parse()
        .map_err(|_| AgentError::malformed(input, "not a number"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(AgentError::malformed(input, "duration must be non-negative"));
    }
    Ok(ms_from_secs(secs))
}

/// Parse a damage amount.
pub fn parse_damage(input: &str) -> Result<u32> {
    input
        .trim()
        .parse()
        .map_err(|_| AgentError::malformed(input, "damage must be a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vectors() {
        let points = parse_vectors("1 2 3 4,5,6").unwrap();
        assert_eq!(
            points,
            vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]
        );
        assert!(parse_vectors("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_vectors_rejects_partial() {
        assert!(parse_vectors("1 2 3 4").is_err());
        assert!(parse_vectors("1 two 3").is_err());
        assert!(parse_vectors("1 inf 3").is_err());
    }

    #[test]
    fn test_path_sentinels() {
        for token in ["-2", "-1", "0", " 0 "] {
            assert_eq!(parse_path_reply(token).unwrap(), PathReply::NoPath);
        }
        assert_eq!(
            parse_path_reply("0 0 0").unwrap(),
            PathReply::Waypoints(vec![Vec3::ZERO])
        );
    }

    #[test]
    fn test_pattern_order() {
        assert_eq!(parse_pattern_order("Patrol").unwrap(), PatternOrder::Patrol);
        assert_eq!(parse_pattern_order(" hold").unwrap(), PatternOrder::Hold);
        assert!(parse_pattern_order("dance").is_err());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse_duration_secs("0.25").unwrap(), 250);
        assert!(parse_duration_secs("-1").is_err());
        assert_eq!(parse_damage("500").unwrap(), 500);
        assert!(parse_damage("-5").is_err());
    }
}
