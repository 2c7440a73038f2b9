use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::{PlayDetails, Repertoire, ScheduleKind};
use crate::NOT_AVAILABLE;
use crate::types::Venue;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("No screening groups found for '{0}'")]
    NoPlayDetails(String),
}

const PRESALE_HEADER: &str = "KUP BILET W PRZEDSPRZEDAŻY";

static RE_PLAY_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+) min").expect("invalid regex: play length"));

static RE_ORIGINAL_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("original-lang").expect("invalid regex: original language"));

static RE_SCREENING_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("Screening type").expect("invalid regex: screening type"));

static RE_LANGUAGE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("subAbbr|dubAbbr|noSubs").expect("invalid regex: language prefix")
});

static RE_LANGUAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("subbed-lang|dubbed-lang").expect("invalid regex: language name")
});

static SEL_MOVIE: LazyLock<Selector> = LazyLock::new(|| selector("div.row.qb-movie"));
static SEL_INFO_COLUMN: LazyLock<Selector> =
    LazyLock::new(|| selector("div.qb-movie-info-column"));
static SEL_INFO_WRAPPER: LazyLock<Selector> =
    LazyLock::new(|| selector("div.qb-movie-info-wrapper"));
static SEL_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static SEL_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h3.qb-movie-name"));
static SEL_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static SEL_LABELLED_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span[aria-label]"));
static SEL_SCREENING_ATTRIBUTES: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.qb-screening-attributes"));
static SEL_PLAY_TIME: LazyLock<Selector> = LazyLock::new(|| selector("a.btn.btn-primary.btn-lg"));
static SEL_VENUE_OPTION: LazyLock<Selector> =
    LazyLock::new(|| selector("option[value][data-tokens]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn labelled_span<'a>(element: ElementRef<'a>, pattern: &Regex) -> Option<ElementRef<'a>> {
    labelled_spans(element, pattern).next()
}

fn labelled_spans<'a, 'b>(
    element: ElementRef<'a>,
    pattern: &'b Regex,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    element.select(&SEL_LABELLED_SPAN).filter(move |span| {
        span.value()
            .attr("aria-label")
            .is_some_and(|label| pattern.is_match(label))
    })
}

pub fn parse_repertoire(html: &str) -> Vec<Repertoire> {
    let document = Html::parse_document(html);

    document
        .select(&SEL_MOVIE)
        .filter(|movie| !is_presale(*movie))
        .filter_map(|movie| {
            parse_movie(movie)
                .inspect_err(|e| log::debug!("Skipping movie block: {e}"))
                .ok()
        })
        .collect()
}

/// Presale films have no showtimes for the requested day.
pub fn is_presale(movie: ElementRef) -> bool {
    movie
        .select(&SEL_INFO_COLUMN)
        .next()
        .and_then(|column| column.select(&SEL_HEADING).next())
        .is_some_and(|header| elem_text(header).trim() == PRESALE_HEADER)
}

pub fn parse_movie(movie: ElementRef) -> Result<Repertoire, ParseError> {
    let title = parse_title(movie)?;
    let play_details = parse_play_details(movie);
    if play_details.is_empty() {
        log::warn!("Film '{title}' has no screening groups, the page layout may have changed");
        return Err(ParseError::NoPlayDetails(title));
    }
    if play_details
        .iter()
        .any(|d| d.schedule_kind() == ScheduleKind::Mixed)
    {
        log::debug!("Film '{title}' mixes showtimes with day labels");
    }

    Ok(Repertoire {
        genres: parse_genres(movie),
        play_length: parse_play_length(movie),
        original_language: parse_original_language(movie),
        title,
        play_details,
    })
}

pub fn parse_title(movie: ElementRef) -> Result<String, ParseError> {
    movie
        .select(&SEL_TITLE)
        .next()
        .map(|e| elem_text(e).trim().to_string())
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ParseError::MissingField("title".to_string()))
}

/// The first span of the info wrapper reads like `"Akcja, Sci-Fi |"`; a span
/// without the pipe is the runtime, meaning the page lists no genres.
pub fn parse_genres(movie: ElementRef) -> String {
    movie
        .select(&SEL_INFO_WRAPPER)
        .next()
        .and_then(|wrapper| wrapper.select(&SEL_SPAN).next())
        .map(elem_text)
        .filter(|raw| raw.contains('|'))
        .map(|raw| raw.replace('|', "").trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn parse_play_length(movie: ElementRef) -> Option<u32> {
    let wrapper = movie.select(&SEL_INFO_WRAPPER).next()?;
    wrapper.select(&SEL_SPAN).find_map(|span| {
        let text = elem_text(span);
        RE_PLAY_LENGTH
            .captures(text.trim())
            .and_then(|caps| caps[1].parse().ok())
    })
}

pub fn parse_original_language(movie: ElementRef) -> Option<String> {
    labelled_span(movie, &RE_ORIGINAL_LANGUAGE)
        .map(|span| elem_text(span).trim().to_string())
        .filter(|language| !language.is_empty())
}

pub fn parse_play_details(movie: ElementRef) -> Vec<PlayDetails> {
    movie
        .select(&SEL_INFO_COLUMN)
        .map(|column| PlayDetails {
            format: parse_play_format(column),
            play_language: parse_play_language(column),
            play_times: parse_play_times(column),
        })
        .collect()
}

pub fn parse_play_format(column: ElementRef) -> String {
    let Some(attributes) = column.select(&SEL_SCREENING_ATTRIBUTES).next() else {
        return NOT_AVAILABLE.to_string();
    };

    let format = labelled_spans(attributes, &RE_SCREENING_TYPE)
        .map(|span| elem_text(span).trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if format.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        format
    }
}

/// Composes `"NAP: PL"`, `"DUB: PL"` or a bare prefix such as `"BEZ NAPISÓW"`.
/// A language without a subtitle/dubbing prefix is not a usable label.
pub fn parse_play_language(column: ElementRef) -> String {
    let Some(prefix) = labelled_span(column, &RE_LANGUAGE_PREFIX)
        .map(|span| elem_text(span).trim().to_string())
        .filter(|prefix| !prefix.is_empty())
    else {
        return NOT_AVAILABLE.to_string();
    };

    let language = labelled_span(column, &RE_LANGUAGE_NAME)
        .map(|span| elem_text(span).trim().to_string())
        .filter(|language| !language.is_empty());

    match language {
        Some(language) => format!("{prefix}: {language}"),
        None => prefix,
    }
}

pub fn parse_play_times(column: ElementRef) -> Vec<String> {
    column
        .select(&SEL_PLAY_TIME)
        .map(|link| normalize_whitespace(&elem_text(link)))
        .collect()
}

pub fn parse_venues(html: &str) -> Vec<Venue> {
    let document = Html::parse_document(html);

    document
        .select(&SEL_VENUE_OPTION)
        .filter_map(|option| {
            let id = option.value().attr("value")?.trim();
            let name = option.value().attr("data-tokens")?.trim();
            if id.is_empty() || name.is_empty() {
                return None;
            }
            Some(Venue::new(id, name))
        })
        .collect()
}
