/// Advice derived from the classified day profiles
use crate::models::DayProfiles;

const COLD: &[&str] = &[
    "Wear a high quality insulated jacket to stay warm",
    "Add a middle layer between shirt and coat",
    "Cover neck and head, and wear gloves",
];

const COLD_HUMID: &[&str] = &[
    "Wear a layer made of breathable materials",
    "Bring a waterproof outer layer",
    "Wear warm, waterproof footwear",
];

const HOT: &[&str] = &[
    "Choose light, water-rich meals such as vegetables and fruit, and avoid heavy dishes",
    "Drink one to two litres of water a day and avoid alcohol",
    "Keep pulse points cool: feet, ankles, wrists, neck, forearms and temples",
    "Wear light, light-coloured clothing",
];

const HOT_HUMID_EXTRA: &str =
    "Exercise during the coolest parts of the day, early morning or at dusk";

const HUMID: &[&str] = &[
    "Wear a layer made of breathable materials",
    "Keep up a steady fluid intake",
    "Exercise in well ventilated areas",
];

const WINDY: &[&str] = &[
    "Wear jackets and trousers made of windproof materials",
    "Protect your eyes with sunglasses or goggles",
];

const STRONG_WIND: &[&str] = &[
    "Wear jackets and trousers made of windproof materials",
    "Outdoors, keep away from ledges, balconies and construction sites",
    // One stored row, two pieces of advice
    "Avoid travelling by motorcycle or bicycle; protect your eyes with sunglasses or goggles",
];

const HIGH_UV: &[&str] = &[
    "Stay in the shade around midday",
    "Wear suitable clothing, a hat and sunglasses",
    "Apply enough sunscreen with adequate protection for your skin",
];

const EXTREME_UV: &[&str] = &[
    "Take extra precautions, unprotected skin can burn quickly",
    "Stay away from UV reflectors such as white sand or bright surfaces",
    "Apply enough sunscreen with adequate protection for your skin",
    "Avoid the sun between 11:00 and 16:00",
];

const LOW_PRESSURE: &[&str] = &[
    "Carry a wind-resistant umbrella",
    "Drive with extra care, storms are possible",
    "If you are sensitive to pressure changes, carry any medication you need and stay hydrated",
];

const MODERATE_AQI: &[&str] = &[
    "Outdoor activity is safe, but people very sensitive to air quality may want to shorten or ease it",
    "Sensitive groups (young children, older adults, people with heart or lung conditions) may want to limit time outdoors",
];

const UNHEALTHY_AQI: &[&str] = &[
    "If you notice eye or throat irritation or breathing difficulty, cut back on outdoor activity",
    "Consider a protective mask, especially if you are sensitive to air quality",
];

/// Build the recommendation list for a pair of day profile labels
pub fn recommendations(profiles: &DayProfiles) -> Vec<&'static str> {
    let p1 = profiles.profile_1.as_str();
    let p2 = profiles.profile_2.as_str();

    let mut advice: Vec<&'static str> = if p1 == "Cold" {
        COLD.to_vec()
    } else if p1.contains("Cold - High Humidity") {
        COLD_HUMID.to_vec()
    } else if p1 == "Hot" {
        HOT.to_vec()
    } else if p1.contains("Hot - High Humidity") {
        let mut hot = HOT.to_vec();
        hot.push(HOT_HUMID_EXTRA);
        hot
    } else if p1 == "High Humidity" {
        HUMID.to_vec()
    } else {
        Vec::new()
    };

    if p1.contains("Windy") {
        advice.extend_from_slice(WINDY);
    } else if p1.contains("Strong Wind") {
        advice.extend_from_slice(STRONG_WIND);
    }

    let profile_2_rules: [(&str, &[&str]); 5] = [
        ("High UV", HIGH_UV),
        ("Extreme UV", EXTREME_UV),
        ("Low Pressure", LOW_PRESSURE),
        ("Moderate AQI", MODERATE_AQI),
        ("Unhealthy AQI", UNHEALTHY_AQI),
    ];
    for (label, lines) in profile_2_rules {
        if p2.contains(label) {
            advice.extend_from_slice(lines);
        }
    }

    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(p1: &str, p2: &str) -> DayProfiles {
        DayProfiles {
            profile_1: p1.to_string(),
            profile_2: p2.to_string(),
        }
    }

    #[test]
    fn test_cold_high_humidity_moderate_aqi() {
        let advice = recommendations(&profiles("Cold - High Humidity", "Moderate AQI"));
        assert_eq!(advice.len(), COLD_HUMID.len() + MODERATE_AQI.len());
        assert_eq!(advice[0], COLD_HUMID[0]);
        assert_eq!(advice[3], MODERATE_AQI[0]);
    }

    #[test]
    fn test_bare_labels_need_exact_match() {
        // "Cold - Windy" is neither "Cold" nor "Cold - High Humidity"
        let advice = recommendations(&profiles("Cold - Windy", ""));
        assert_eq!(advice, WINDY.to_vec());
    }

    #[test]
    fn test_hot_humid_adds_exercise_advice() {
        let advice = recommendations(&profiles("Hot - High Humidity - Strong Wind", "Normal"));
        assert_eq!(advice.len(), HOT.len() + 1 + STRONG_WIND.len());
        assert!(advice.contains(&HOT_HUMID_EXTRA));
    }

    #[test]
    fn test_strong_wind_row_count() {
        let advice = recommendations(&profiles("Strong Wind", "Normal"));
        assert_eq!(advice.len(), 3);
        assert!(advice[2].starts_with("Avoid travelling by motorcycle"));
        assert!(advice[2].contains("protect your eyes"));
    }

    #[test]
    fn test_profile_2_rules_stack() {
        let advice = recommendations(&profiles("Mild", "Low Pressure - High UV - Unhealthy AQI"));
        assert_eq!(
            advice.len(),
            HIGH_UV.len() + LOW_PRESSURE.len() + UNHEALTHY_AQI.len()
        );
        assert_eq!(advice[0], HIGH_UV[0]);
    }

    #[test]
    fn test_no_matching_labels() {
        assert!(recommendations(&profiles("Mild", "Normal")).is_empty());
    }
}
