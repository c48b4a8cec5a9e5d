//! CSV export of one city or the whole dataset

use crate::data::{CityRecord, Dataset};
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ALL_CITIES_FILENAME: &str = "world_cities_data.csv";

const LIST_SEPARATOR: &str = " | ";

const ALL_CITIES_HEADER: [&str; 11] = [
    "City",
    "Country",
    "Continent",
    "Population",
    "Latitude",
    "Longitude",
    "Language",
    "Currency",
    "Timezone",
    "Founded",
    "Famous For",
];

/// A file the user asked to download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub filename: String,
    pub content: String,
}

impl Download {
    pub fn for_city(city: &CityRecord) -> Result<Self> {
        Ok(Self {
            filename: city_filename(&city.name),
            content: city_csv(city)?,
        })
    }

    pub fn for_dataset(dataset: &Dataset) -> Result<Self> {
        Ok(Self {
            filename: ALL_CITIES_FILENAME.to_string(),
            content: all_cities_csv(dataset)?,
        })
    }
}

/// `New York` -> `new_york_data.csv`
pub fn city_filename(name: &str) -> String {
    format!("{}_data.csv", name.to_lowercase().replace(' ', "_"))
}

/// Two-column (Field, Value) table of one city
pub fn city_csv(city: &CityRecord) -> Result<String> {
    let rows: [(&str, String); 13] = [
        ("City", city.name.clone()),
        ("Country", city.country.clone()),
        ("Continent", city.continent.clone()),
        ("Population", city.population.to_string()),
        ("Latitude", city.lat.to_string()),
        ("Longitude", city.lon.to_string()),
        ("Language", city.language.clone()),
        ("Currency", city.currency.clone()),
        ("Timezone", city.timezone.clone()),
        ("Founded", founded(city).to_string()),
        ("Famous For", city.best_known_for.clone()),
        ("Top Attractions", city.top_attractions.join(LIST_SEPARATOR)),
        ("Fun Facts", city.fun_facts.join(LIST_SEPARATOR)),
    ];

    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(["Field", "Value"])?;
    for (field, value) in &rows {
        w.write_record([*field, value.as_str()])?;
    }
    finish(w)
}

/// One row per city, header first, dataset order
pub fn all_cities_csv(dataset: &Dataset) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(ALL_CITIES_HEADER)?;
    for city in dataset.cities() {
        let (population, lat, lon) = (
            city.population.to_string(),
            city.lat.to_string(),
            city.lon.to_string(),
        );
        w.write_record([
            city.name.as_str(),
            city.country.as_str(),
            city.continent.as_str(),
            population.as_str(),
            lat.as_str(),
            lon.as_str(),
            city.language.as_str(),
            city.currency.as_str(),
            city.timezone.as_str(),
            founded(city),
            city.best_known_for.as_str(),
        ])?;
    }
    finish(w)
}

/// Save a download into `dir`, returning the written path
pub fn write_download(dir: &Path, download: &Download) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&download.filename);
    fs::write(&path, download.content.as_bytes())?;
    Ok(path)
}

fn founded(city: &CityRecord) -> &str {
    city.founded.as_deref().unwrap_or("Unknown")
}

fn finish(w: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = w.into_inner().map_err(|e| e.into_error())?;
    // Every field written came from a `str`
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{city, styles};
    use std::collections::HashMap;

    fn tricky() -> CityRecord {
        let mut c = city("Rio de Janeiro", "South America", 13_500_000);
        c.lat = -22.9068;
        c.lon = -43.1729;
        c.currency = "Brazilian Real (R$)".into();
        c.best_known_for = "Carnival, Beaches, \"Cidade Maravilhosa\"".into();
        c.top_attractions = vec!["Christ the Redeemer".into(), "Sugarloaf, by cable car".into()];
        c.fun_facts = vec!["Line one\nline two".into(), "Fact two".into()];
        c.founded = Some("1565".into());
        c
    }

    fn parse_pairs(text: &str) -> HashMap<String, String> {
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        assert_eq!(rdr.headers().unwrap(), vec!["Field", "Value"]);
        rdr.records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].to_string())
            })
            .collect()
    }

    #[test]
    fn test_city_csv_round_trip() {
        let c = tricky();
        let fields = parse_pairs(&city_csv(&c).unwrap());
        assert_eq!(fields.len(), 13);
        assert_eq!(fields["City"], c.name);
        assert_eq!(fields["Country"], c.country);
        assert_eq!(fields["Continent"], c.continent);
        assert_eq!(fields["Population"].parse::<u64>().unwrap(), c.population);
        assert_eq!(fields["Latitude"].parse::<f64>().unwrap(), c.lat);
        assert_eq!(fields["Longitude"].parse::<f64>().unwrap(), c.lon);
        assert_eq!(fields["Language"], c.language);
        assert_eq!(fields["Currency"], c.currency);
        assert_eq!(fields["Timezone"], c.timezone);
        assert_eq!(fields["Founded"], "1565");
        assert_eq!(fields["Famous For"], c.best_known_for);
        assert_eq!(fields["Top Attractions"], "Christ the Redeemer | Sugarloaf, by cable car");
        assert_eq!(fields["Fun Facts"], "Line one\nline two | Fact two");
    }

    #[test]
    fn test_city_csv_defaults() {
        let c = city("Plainville", "Asia", 10);
        let fields = parse_pairs(&city_csv(&c).unwrap());
        assert_eq!(fields["Founded"], "Unknown");
        assert_eq!(fields["Fun Facts"], "");
    }

    #[test]
    fn test_city_csv_quotes_commas() {
        let text = city_csv(&tricky()).unwrap();
        assert!(text.starts_with("Field,Value\n"));
        assert!(text.contains("\"Christ the Redeemer | Sugarloaf, by cable car\""));
        assert!(text.contains("\"\"Cidade Maravilhosa\"\""));
    }

    #[test]
    fn test_all_cities_csv() {
        let ds = Dataset::new(
            vec![city("B Town", "Asia", 5), tricky(), city("A Town", "Europe", 7)],
            styles(),
        )
        .unwrap();
        let text = all_cities_csv(&ds).unwrap();
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        assert_eq!(rdr.headers().unwrap(), ALL_CITIES_HEADER.to_vec());

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        let names: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
        assert_eq!(names, vec!["B Town", "Rio de Janeiro", "A Town"]);
        assert_eq!(&rows[1][10], "Carnival, Beaches, \"Cidade Maravilhosa\"");
        assert_eq!(&rows[0][9], "Unknown");
        assert_eq!(&rows[2][3], "7");
    }

    #[test]
    fn test_filenames() {
        assert_eq!(city_filename("New York"), "new_york_data.csv");
        assert_eq!(city_filename("São Paulo"), "são_paulo_data.csv");
        let ds = Dataset::new(vec![city("Tokyo", "Asia", 1)], styles()).unwrap();
        assert_eq!(Download::for_dataset(&ds).unwrap().filename, ALL_CITIES_FILENAME);
        assert_eq!(Download::for_city(&tricky()).unwrap().filename, "rio_de_janeiro_data.csv");
    }

    #[test]
    fn test_write_download() {
        let dir = std::env::temp_dir().join(format!("globe-explorer-test-{}", std::process::id()));
        let download = Download::for_city(&tricky()).unwrap();
        let path = write_download(&dir, &download).unwrap();
        assert_eq!(path.file_name().unwrap(), "rio_de_janeiro_data.csv");
        assert_eq!(fs::read_to_string(&path).unwrap(), download.content);
        let _ = fs::remove_dir_all(&dir);
    }
}
