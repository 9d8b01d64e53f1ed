//! Parser for the MovieLens CSV exports.
//!
//! - movies.csv: movieId,title,genres
//! - ratings.csv: userId,movieId,rating,timestamp
//!
//! Both files start with a header row. Rows are decoded with the `csv`
//! crate into serde records, so quoted titles (embedded commas, doubled
//! quotes, line breaks) need no special handling here. The rating timestamp
//! is decoded to catch corrupt rows and then dropped.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::path::Path;

/// One row of movies.csv
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

/// One row of ratings.csv
#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    #[allow(dead_code)]
    timestamp: i64,
}

/// Map a `csv` failure onto the loader's error, keeping the row's line
fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
    let reason = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => DataLoadError::Io(e),
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => DataLoadError::ColumnCount {
            file: file.to_string(),
            line: pos.map(|p| p.line()).unwrap_or(line),
            expected: expected_len,
            found: len,
        },
        _ => DataLoadError::Csv {
            file: file.to_string(),
            line,
            reason,
        },
    }
}

/// Decode every data row of a CSV export into `T`
fn read_records<T>(path: &Path, file_name: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(file_name, e))?;

    reader
        .deserialize()
        .map(|row| row.map_err(|e| csv_error(file_name, e)))
        .collect()
}

/// Parse the movies.csv file
///
/// The title often includes the year in parentheses: "Toy Story (1995)".
/// Genres are pipe-separated: "Adventure|Animation|Children".
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let records: Vec<MovieRecord> = read_records(path, "movies.csv")?;

    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            if record.title.is_empty() {
                return Err(DataLoadError::Csv {
                    file: "movies.csv".to_string(),
                    // header is line 1
                    line: idx as u64 + 2,
                    reason: format!("movie {} has no title", record.movie_id),
                });
            }
            Ok(Movie {
                id: record.movie_id,
                year: extract_year_from_title(&record.title),
                genres: parse_genres(&record.genres),
                title: record.title,
            })
        })
        .collect()
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let records: Vec<RatingRecord> = read_records(path, "ratings.csv")?;

    Ok(records
        .into_iter()
        .map(|record| Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
        })
        .collect())
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        let year_str = title[start + 1..end].trim();
        if let Ok(year) = year_str.parse::<u16>() {
            return Some(year);
        }
    }
    None
}

/// Parse pipe-separated genres, keeping the raw labels
fn parse_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Write `content` to `name` inside a fresh temporary directory.
    /// The directory is removed when the returned guard drops.
    fn write_temp(name: &str, content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Babylon 5"), None);
        assert_eq!(extract_year_from_title("Movie Title"), None);
    }

    #[test]
    fn test_parse_genres() {
        assert_eq!(
            parse_genres("Adventure|Animation|Children"),
            vec!["Adventure", "Animation", "Children"]
        );
        assert_eq!(parse_genres("(no genres listed)"), vec!["(no genres listed)"]);
    }

    #[test]
    fn test_parse_movies_file() {
        let (_dir, path) = write_temp(
            "movies.csv",
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Children\n\
             11,\"American President, The (1995)\",Comedy|Drama|Romance\n\
             7,\"Say \"\"Cheese\"\", Please (2001)\",Comedy\n",
        );

        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 3);
        assert_eq!(movies[0].id, 1);
        assert_eq!(movies[0].year, Some(1995));
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[1].genres.len(), 3);
        assert_eq!(movies[2].title, r#"Say "Cheese", Please (2001)"#);
        assert_eq!(movies[2].year, Some(2001));
    }

    #[test]
    fn test_quoted_title_across_lines() {
        let (_dir, path) = write_temp(
            "movies.csv",
            "movieId,title,genres\n\
             5,\"Two\nLines (1999)\",Drama\n\
             6,Heat (1995),Action\n",
        );

        let movies = parse_movies(&path).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Two\nLines (1999)");
        assert_eq!(movies[1].id, 6);
    }

    #[test]
    fn test_parse_ratings_file() {
        let (_dir, path) = write_temp(
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,31,2.5,1260759144\n\n1,1029,3.0,1260759179\n",
        );

        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[0].movie_id, 31);
        assert_eq!(ratings[0].rating, 2.5);
    }

    #[test]
    fn test_parse_ratings_wrong_column_count() {
        let (_dir, path) = write_temp(
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,31,2.5\n",
        );

        let err = parse_ratings(&path).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::ColumnCount { expected: 4, found: 3, line: 2, .. }
        ));
    }

    #[test]
    fn test_parse_ratings_bad_value_reports_line() {
        let (_dir, path) = write_temp(
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,31,2.5,1260759144\n2,31,great,1260759144\n",
        );

        match parse_ratings(&path) {
            Err(DataLoadError::Csv { file, line, .. }) => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(line, 3);
            }
            other => panic!("expected Csv error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ratings_bad_timestamp() {
        let (_dir, path) = write_temp(
            "ratings.csv",
            "userId,movieId,rating,timestamp\n1,31,2.5,yesterday\n",
        );

        assert!(matches!(
            parse_ratings(&path),
            Err(DataLoadError::Csv { line: 2, .. })
        ));
    }
}
