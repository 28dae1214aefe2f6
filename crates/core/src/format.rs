//! Deterministic textual rendering of search results.

use crate::domain::influencer::Influencer;

/// Render one result page as a header plus one bullet per influencer. A zero
/// match count still renders the header; callers never special-case it.
pub fn format_results(influencers: &[Influencer]) -> String {
    let bullets =
        influencers.iter().map(format_influencer_line).collect::<Vec<_>>().join("\n");
    format!("Found {} influencers:\n\n{bullets}", influencers.len())
}

fn format_influencer_line(influencer: &Influencer) -> String {
    let min_price_cents = influencer.min_price_cents();
    let price = if min_price_cents > 0 {
        format!("${}.{:02}", min_price_cents / 100, min_price_cents % 100)
    } else {
        "N/A".to_string()
    };

    let tier = influencer.profile.tier.as_deref().unwrap_or("Unknown");
    let genre = influencer.profile.genre.as_deref().unwrap_or("Unknown");
    let location = influencer.profile.location.as_deref().unwrap_or("Unknown");

    format!(
        "\u{2022} {} - {tier} tier, {genre} genre, {location}. Starting price: {price}",
        influencer.name
    )
}
