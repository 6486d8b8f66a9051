use crate::models::{MovieDetail, MoviePage, MovieSummary, Video};
use crate::tmdb::image_url;
use serde::Serialize;
use std::collections::HashSet;

pub const CARD_POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "original";
pub const PROFILE_SIZE: &str = "w185";

const STAR_COUNT: usize = 5;
const MAX_CAST: usize = 10;
const MAX_SIMILAR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StarFill {
    Full,
    Partial,
    Empty,
}

/// Rescale a 0..=max rating to five stars. Per star index `i` the threshold is
/// `scaled - i`: a full star at >= 1, a partial star strictly between 0 and 1,
/// empty otherwise.
pub fn rating_stars(value: f64, max: f64) -> Vec<StarFill> {
    let scaled = if max > 0.0 {
        value / max * STAR_COUNT as f64
    } else {
        0.0
    };
    (0..STAR_COUNT)
        .map(|i| {
            let threshold = scaled - i as f64;
            if threshold >= 1.0 {
                StarFill::Full
            } else if threshold > 0.0 {
                StarFill::Partial
            } else {
                StarFill::Empty
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    pub stars: Vec<StarFill>,
    pub display: String,
}

pub fn rating(value: f64) -> RatingView {
    RatingView {
        stars: rating_stars(value, 10.0),
        display: format!("{value:.1}"),
    }
}

pub fn release_year(date: Option<&str>) -> Option<String> {
    let year = date?.split('-').next()?.trim();
    if year.is_empty() {
        None
    } else {
        Some(year.to_string())
    }
}

pub fn format_runtime(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => "Unknown".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieCardView {
    pub id: i64,
    pub title: String,
    pub poster_url: String,
    pub release_year: Option<String>,
    pub rating: RatingView,
    pub is_favorite: bool,
}

pub fn movie_card(movie: &MovieSummary, favorites: &HashSet<i64>) -> MovieCardView {
    MovieCardView {
        id: movie.id,
        title: movie.title.clone(),
        poster_url: image_url(movie.poster_path.as_deref(), CARD_POSTER_SIZE),
        release_year: release_year(movie.release_date.as_deref()),
        rating: rating(movie.vote_average),
        is_favorite: favorites.contains(&movie.id),
    }
}

pub fn movie_cards(movies: &[MovieSummary], favorites: &HashSet<i64>) -> Vec<MovieCardView> {
    movies.iter().map(|m| movie_card(m, favorites)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationView {
    pub page: i64,
    pub total_pages: i64,
    pub total_results: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

pub fn pagination(page: &MoviePage) -> PaginationView {
    PaginationView {
        page: page.page,
        total_pages: page.total_pages,
        total_results: page.total_results,
        has_previous: page.page > 1,
        has_next: page.page < page.total_pages,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrailerView {
    pub name: String,
    pub embed_url: String,
}

/// YouTube trailers only, preferring official uploads over the first match.
pub fn select_trailer(videos: &[Video]) -> Option<TrailerView> {
    let mut trailers = videos
        .iter()
        .filter(|v| v.site.eq_ignore_ascii_case("YouTube") && v.kind == "Trailer");
    let first = trailers.next()?;
    let chosen = if first.official {
        first
    } else {
        trailers.find(|v| v.official).unwrap_or(first)
    };
    Some(TrailerView {
        name: chosen.name.clone(),
        embed_url: format!("https://www.youtube.com/embed/{}", chosen.key),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CastView {
    pub name: String,
    pub character: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailView {
    pub id: i64,
    pub title: String,
    pub tagline: Option<String>,
    pub overview: String,
    pub poster_url: String,
    pub backdrop_url: Option<String>,
    pub release_year: Option<String>,
    pub runtime: String,
    pub rating: RatingView,
    pub genres: Vec<String>,
    pub trailer: Option<TrailerView>,
    pub cast: Vec<CastView>,
    pub similar: Vec<MovieCardView>,
    pub is_favorite: bool,
}

pub fn movie_detail(detail: &MovieDetail, favorites: &HashSet<i64>) -> MovieDetailView {
    let cast = detail
        .credits
        .cast
        .iter()
        .take(MAX_CAST)
        .map(|person| CastView {
            name: person.name.clone(),
            character: person.character.clone().unwrap_or_default(),
            profile_url: image_url(person.profile_path.as_deref(), PROFILE_SIZE),
        })
        .collect();
    let similar = detail
        .similar
        .as_ref()
        .map(|page| {
            let shown = &page.results[..page.results.len().min(MAX_SIMILAR)];
            movie_cards(shown, favorites)
        })
        .unwrap_or_default();

    MovieDetailView {
        id: detail.id,
        title: detail.title.clone(),
        tagline: detail.tagline.clone().filter(|t| !t.is_empty()),
        overview: detail.overview.clone(),
        poster_url: image_url(detail.poster_path.as_deref(), CARD_POSTER_SIZE),
        backdrop_url: detail
            .backdrop_path
            .as_deref()
            .map(|p| image_url(Some(p), BACKDROP_SIZE)),
        release_year: release_year(detail.release_date.as_deref()),
        runtime: format_runtime(detail.runtime),
        rating: rating(detail.vote_average),
        genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
        trailer: select_trailer(&detail.videos.results),
        cast,
        similar,
        is_favorite: favorites.contains(&detail.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(key: &str, site: &str, kind: &str, official: bool) -> Video {
        Video {
            key: key.to_string(),
            site: site.to_string(),
            kind: kind.to_string(),
            official,
            name: format!("Video {key}"),
        }
    }

    #[test]
    fn rating_eight_of_ten_fills_four_stars() {
        // 8.0 / 10 scales to 4.0; star index 3 sits exactly on the boundary.
        let stars = rating_stars(8.0, 10.0);
        assert_eq!(
            stars,
            vec![
                StarFill::Full,
                StarFill::Full,
                StarFill::Full,
                StarFill::Full,
                StarFill::Empty,
            ]
        );
    }

    #[test]
    fn rating_partial_star_between_thresholds() {
        let stars = rating_stars(7.0, 10.0);
        assert_eq!(stars[2], StarFill::Full);
        assert_eq!(stars[3], StarFill::Partial);
        assert_eq!(stars[4], StarFill::Empty);
    }

    #[test]
    fn rating_extremes() {
        assert!(rating_stars(0.0, 10.0).iter().all(|s| *s == StarFill::Empty));
        assert!(rating_stars(10.0, 10.0).iter().all(|s| *s == StarFill::Full));
    }

    #[test]
    fn release_year_from_date_string() {
        assert_eq!(release_year(Some("2024-01-01")), Some("2024".to_string()));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn runtime_formats_hours_and_minutes() {
        assert_eq!(format_runtime(Some(125)), "2h 5m");
        assert_eq!(format_runtime(Some(60)), "1h 0m");
        assert_eq!(format_runtime(Some(0)), "Unknown");
        assert_eq!(format_runtime(None), "Unknown");
    }

    #[test]
    fn pagination_flags_at_bounds() {
        let page = |n| MoviePage {
            page: n,
            results: Vec::new(),
            total_pages: 5,
            total_results: 100,
        };

        let middle = pagination(&page(2));
        assert!(middle.has_previous && middle.has_next);

        let first = pagination(&page(1));
        assert!(!first.has_previous && first.has_next);

        let last = pagination(&page(5));
        assert!(last.has_previous && !last.has_next);
    }

    #[test]
    fn trailer_prefers_official_youtube_upload() {
        let videos = vec![
            video("teaser", "YouTube", "Teaser", true),
            video("fan", "YouTube", "Trailer", false),
            video("vimeo", "Vimeo", "Trailer", true),
            video("official", "YouTube", "Trailer", true),
        ];
        let trailer = select_trailer(&videos).unwrap();
        assert_eq!(trailer.embed_url, "https://www.youtube.com/embed/official");
    }

    #[test]
    fn trailer_falls_back_to_first_youtube_trailer() {
        let videos = vec![
            video("a", "YouTube", "Trailer", false),
            video("b", "YouTube", "Trailer", false),
        ];
        let trailer = select_trailer(&videos).unwrap();
        assert_eq!(trailer.embed_url, "https://www.youtube.com/embed/a");
        assert!(select_trailer(&[video("c", "YouTube", "Teaser", true)]).is_none());
    }
}
