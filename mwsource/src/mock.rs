//! Deterministic placeholder data
//!
//! Served when an upstream call fails and the fallback is enabled. The content
//! only depends on the provider, the category, the offset and the position in
//! the page, so two identical requests always get the same answer.

use crate::models::{ModelListing, ModelPage, ModelRequest, ProviderKind, VideoListing, VideoPage};
use crate::pagination::Pagination;

/// Upper bound of a mock page, whatever the requested limit
pub const MAX_MOCK_ITEMS: u32 = 48;

const NAMES: &[&str] = &[
    "Luna", "Scarlett", "Jade", "Roxy", "Nova", "Mia", "Sasha", "Lola", "Ivy", "Kira", "Zoe",
    "Bella",
];

const ETHNICITIES: &[&str] = &["asian", "ebony", "latina", "white", "middle_eastern", "indian"];

const BODY_TYPES: &[&str] = &["petite", "athletic", "curvy", "bbw"];

const TAGS: &[&str] = &[
    "domination", "roleplay", "fetish", "latex", "femdom", "bondage", "feet", "leather",
];

/// Small stable mix of the inputs, enough to vary the content per slot
fn mix(seed: &str, n: u64) -> u64 {
    seed.bytes()
        .fold(n.wrapping_mul(0x9E37_79B9_7F4A_7C15), |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0100_0000_01B3)
        })
}

fn page_len(request: &ModelRequest) -> u32 {
    request.limit.min(MAX_MOCK_ITEMS)
}

/// Mock models for `provider`
pub fn mock_models(provider: ProviderKind, request: &ModelRequest) -> ModelPage {
    let category = request.category_or("girls");
    let seed = format!("{}:{}", provider.as_str(), category);

    let items: Vec<ModelListing> = (0..page_len(request))
        .map(|i| {
            let position = request.offset as u64 + i as u64;
            let h = mix(&seed, position);
            let name = format!("{} {}", NAMES[(h % NAMES.len() as u64) as usize], position + 1);
            let id = format!("mock-{}-{}-{}", provider.as_str(), category, position);

            let mut listing = ModelListing::new(id.clone(), name, provider);
            listing.thumbnail = Some(format!("https://placehold.co/320x180?text={id}"));
            listing.preview_image = Some(format!("https://placehold.co/896x503?text={id}"));
            listing.age = Some(18 + (h % 30) as u32);
            listing.ethnicity = Some(ETHNICITIES[(h >> 8) as usize % ETHNICITIES.len()].to_string());
            listing.body_type = Some(BODY_TYPES[(h >> 16) as usize % BODY_TYPES.len()].to_string());
            listing.tags = (0..3)
                .map(|k| TAGS[((h >> (24 + 4 * k)) as usize) % TAGS.len()].to_string())
                .collect();
            listing.tags.dedup();
            listing.is_online = provider != ProviderKind::Vpapi && h % 3 != 0;
            listing.viewer_count = if listing.is_online { h % 5000 } else { 0 };
            listing
        })
        .collect();

    let pagination = Pagination::from_page_len(request.limit, request.offset, items.len());
    ModelPage { items, pagination }
}

/// Mock videos, shaped like the video feed
pub fn mock_videos(request: &ModelRequest) -> VideoPage {
    let category = request.category_or("straight");
    let seed = format!("videos:{category}");

    let items: Vec<VideoListing> = (0..page_len(request))
        .map(|i| {
            let position = request.offset as u64 + i as u64;
            let h = mix(&seed, position);
            let id = format!("mock-video-{category}-{position}");
            let performer = NAMES[(h % NAMES.len() as u64) as usize];

            VideoListing {
                title: format!("{} session #{}", performer, position + 1),
                thumbnail: Some(format!("https://placehold.co/320x180?text={id}")),
                preview_images: (1..=3)
                    .map(|k| format!("https://placehold.co/320x180?text={id}-{k}"))
                    .collect(),
                duration: 60 + (h % 1800) as u32,
                tags: vec![TAGS[(h >> 8) as usize % TAGS.len()].to_string()],
                performer_name: Some(performer.to_string()),
                quality: Some(if h % 2 == 0 { "hd" } else { "sd" }.to_string()),
                target_url: None,
                provider: ProviderKind::Vpapi,
                id,
            }
        })
        .collect();

    let pagination = Pagination::from_page_len(request.limit, request.offset, items.len());
    VideoPage { items, pagination }
}
