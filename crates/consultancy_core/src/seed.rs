//! crates/consultancy_core/src/seed.rs
//!
//! Demonstration blog posts and testimonials shown while the site has little
//! live content. Seed items are appended after live items and never replace a
//! live item with the same identity (slug for posts, id for testimonials).

use crate::domain::{BlogPost, Testimonial};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SeedContent {
    pub blog_posts: Vec<BlogPost>,
    pub testimonials: Vec<Testimonial>,
}

impl SeedContent {
    /// The default demonstration content, dated relative to `now`.
    pub fn demonstration(now: DateTime<Utc>) -> Self {
        let post = |n: u128, title: &str, slug: &str, content: &str, tags: &[&str], age_days: i64| {
            BlogPost {
                id: Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0100 + n),
                title: title.to_string(),
                slug: slug.to_string(),
                content: content.to_string(),
                image: None,
                tags: tags.iter().map(|t| t.to_string()).collect(),
                created_at: now - Duration::days(age_days),
            }
        };
        let testimonial = |n: u128, name: &str, org: &str, text: &str| Testimonial {
            id: Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0200 + n),
            name: name.to_string(),
            org: Some(org.to_string()),
            rating: Some(5),
            text: text.to_string(),
            photo: None,
            approved: true,
            created_at: now,
        };

        Self {
            blog_posts: vec![
                post(
                    1,
                    "The Future of Strategic Communications",
                    "future-of-strategic-communications",
                    "In an increasingly digital world, strategic communications must evolve...",
                    &["Strategy", "Digital", "Future"],
                    0,
                ),
                post(
                    2,
                    "Crisis Communication Best Practices",
                    "crisis-communication-best-practices",
                    "When crisis strikes, having a well-prepared communication strategy...",
                    &["Crisis", "Management", "Best Practices"],
                    1,
                ),
                post(
                    3,
                    "Building Authentic Brand Stories",
                    "building-authentic-brand-stories",
                    "Authentic storytelling is the cornerstone of effective brand communication...",
                    &["Branding", "Storytelling", "Authenticity"],
                    2,
                ),
            ],
            testimonials: vec![
                testimonial(
                    1,
                    "Sarah Johnson",
                    "Tech Innovations Ltd",
                    "Their strategic approach and attention to detail helped us navigate a complex product launch successfully.",
                ),
                testimonial(
                    2,
                    "Michael Chen",
                    "Global Manufacturing Corp",
                    "During our crisis situation they provided exceptional guidance and helped us maintain stakeholder confidence.",
                ),
                testimonial(
                    3,
                    "Emily Rodriguez",
                    "Healthcare Solutions Inc",
                    "The team helped us develop a compelling brand story that resonated with our audience.",
                ),
            ],
        }
    }

    pub fn merge_blog_posts(&self, live: Vec<BlogPost>) -> Vec<BlogPost> {
        merge_live_first(live, &self.blog_posts, |p| p.slug.clone())
    }

    pub fn merge_testimonials(&self, live: Vec<Testimonial>) -> Vec<Testimonial> {
        merge_live_first(live, &self.testimonials, |t| t.id)
    }

    pub fn blog_post(&self, slug: &str) -> Option<BlogPost> {
        self.blog_posts.iter().find(|p| p.slug == slug).cloned()
    }
}

fn merge_live_first<T: Clone, K: PartialEq>(
    mut live: Vec<T>,
    seed: &[T],
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let extra: Vec<T> = seed
        .iter()
        .filter(|s| !live.iter().any(|l| key(l) == key(s)))
        .cloned()
        .collect();
    live.extend(extra);
    live
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_items_win_over_seed_with_same_identity() {
        let now = Utc::now();
        let seed = SeedContent::demonstration(now);
        let mut live = seed.blog_posts[1].clone();
        live.id = Uuid::new_v4();
        live.content = "Live body".to_string();

        let merged = seed.merge_blog_posts(vec![live.clone()]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], live);
        assert_eq!(
            merged.iter().filter(|p| p.slug == live.slug).count(),
            1
        );
    }

    #[test]
    fn empty_seed_leaves_live_content_alone() {
        let seed = SeedContent::default();
        assert!(seed.merge_testimonials(Vec::new()).is_empty());
        let demo = SeedContent::demonstration(Utc::now());
        assert_eq!(seed.merge_testimonials(demo.testimonials.clone()), demo.testimonials);
    }
}
