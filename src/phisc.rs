//! Colonoscopy episodes from the hospital's PHISC text extract.
//!
//! Each line of the extract is a whitespace separated record. The layout isn't documented, but
//! it is fixed enough to find what we need relative to two landmarks:
//!
//!  - the second-to-last token holds the procedure codes,
//!  - the diagnosis codes start after a token that is `04` or starts with `04G`. The procedure
//!    date is two tokens before this anchor, and the birth date (inside a longer token) three
//!    before it.
//!
//! Lines that don't have these landmarks are not colonoscopies and are skipped.
use crate::{
    check_extension,
    dates::{format_compact, parse_compact},
    doctors::DoctorDirectory,
    load_csv, save_csv,
    util::{char_slice, digits_only},
    ArcStr, Result,
};
use anyhow::Context;
use chrono::NaiveDate;
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    io::{self, BufRead},
    path::Path,
};

/// The intermediate table of parsed colonoscopies.
pub const EPISODES_TABLE: &str = "adr.csv";

/// The colonoscopy item numbers we count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// 32090: colonoscopy
    Colonoscopy,
    /// 32093: colonoscopy with polypectomy. Only these carry pathology.
    Polypectomy,
}

impl Procedure {
    pub fn code(self) -> &'static str {
        match self {
            Procedure::Colonoscopy => "32090",
            Procedure::Polypectomy => "32093",
        }
    }

    /// Find a recognised item number inside a token of procedure codes.
    ///
    /// A token holding both item numbers counts as a plain colonoscopy.
    pub fn find_in(token: &str) -> Option<Self> {
        [Procedure::Colonoscopy, Procedure::Polypectomy]
            .into_iter()
            .find(|p| token.contains(p.code()))
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Procedure {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "32090" => Ok(Procedure::Colonoscopy),
            "32093" => Ok(Procedure::Polypectomy),
            _ => bail!("unrecognised procedure code \"{}\"", input),
        }
    }
}

/// The polyp pathology types that count towards the adenoma detection rate.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Pathology {
    /// 2M8211/0
    pub tubular: bool,
    /// 2M8213/0
    pub serrated: bool,
    /// 2M8263/0
    pub tubulovillous: bool,
}

impl Pathology {
    /// Any adenoma found.
    pub fn has_polyp(&self) -> bool {
        self.tubular || self.serrated || self.tubulovillous
    }

    /// Record a pathology code. Returns `false` if it isn't one of ours.
    fn mark(&mut self, code: &str) -> bool {
        match code {
            "2M8211/0" => self.tubular = true,
            "2M8213/0" => self.serrated = true,
            "2M8263/0" => self.tubulovillous = true,
            _ => return false,
        }
        true
    }
}

/// One colonoscopy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub date: NaiveDate,
    /// Lower case.
    pub surname: ArcStr,
    pub mrn: ArcStr,
    /// `None` when neither the extract nor the practice had a usable birth date.
    pub dob: Option<NaiveDate>,
    /// Lower-cased doctor name, `unknown` if the practice had no record.
    pub doctor: ArcStr,
    pub procedure: Procedure,
    pub pathology: Pathology,
    /// Other `2M` morphology codes, in the order found.
    pub malignancy: Vec<ArcStr>,
}

/// An episode as stored in the intermediate `adr.csv` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EpisodeRow {
    date: String,
    surname: String,
    mrn: String,
    dob: String,
    doc: String,
    procedure: String,
    ta: String,
    sa: String,
    tva: String,
    malig: String,
}

impl From<&Episode> for EpisodeRow {
    fn from(ep: &Episode) -> Self {
        let flag = |set: bool, name: &str| if set { name.to_owned() } else { String::new() };
        Self {
            date: format_compact(ep.date),
            surname: ep.surname.to_string(),
            mrn: ep.mrn.to_string(),
            dob: ep.dob.map(format_compact).unwrap_or_else(|| "?".into()),
            doc: ep.doctor.to_string(),
            procedure: ep.procedure.code().into(),
            ta: flag(ep.pathology.tubular, "ta"),
            sa: flag(ep.pathology.serrated, "sa"),
            tva: flag(ep.pathology.tubulovillous, "tva"),
            malig: ep.malignancy.join(" "),
        }
    }
}

impl TryFrom<EpisodeRow> for Episode {
    type Error = Error;
    fn try_from(row: EpisodeRow) -> Result<Self> {
        let date = parse_compact(&row.date)
            .ok_or_else(|| format_err!("bad procedure date \"{}\"", row.date))?;
        let dob = match row.dob.as_str() {
            "?" | "" => None,
            dob => {
                let parsed = parse_compact(dob);
                if parsed.is_none() {
                    event!(
                        Level::WARN,
                        "treating unreadable birth date \"{}\" (mrn {}) as missing",
                        dob,
                        row.mrn
                    );
                }
                parsed
            }
        };
        Ok(Episode {
            date,
            surname: row.surname.into(),
            mrn: row.mrn.into(),
            dob,
            doctor: row.doc.into(),
            procedure: row.procedure.parse()?,
            pathology: Pathology {
                tubular: !row.ta.is_empty(),
                serrated: !row.sa.is_empty(),
                tubulovillous: !row.tva.is_empty(),
            },
            malignancy: row.malig.split_whitespace().map(Into::into).collect(),
        })
    }
}

/// The token marking the start of the diagnosis codes.
fn is_anchor(token: &str) -> bool {
    token == "04" || token.starts_with("04G")
}

/// Parse one line of the extract. Lines that aren't usable colonoscopies give `None`.
pub fn parse_line(line: &str, directory: &DoctorDirectory) -> Option<Episode> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let procedure = Procedure::find_in(tokens[tokens.len() - 2])?;
    let surname = tokens[2].to_lowercase();

    let anchor = tokens.iter().position(|tok| is_anchor(tok))?;
    if anchor < 3 {
        event!(Level::DEBUG, "anchor too early, skipping: {}", line.trim());
        return None;
    }
    let raw_date = char_slice(tokens[anchor - 2], 0, 8);
    let Some(date) = parse_compact(raw_date) else {
        event!(Level::DEBUG, "bad procedure date \"{}\", skipping", raw_date);
        return None;
    };
    let raw_dob = digits_only(tokens[anchor - 3]);
    let raw_dob = char_slice(&raw_dob, 4, 12);

    let mut pathology = Pathology::default();
    let mut malignancy = vec![];
    if procedure == Procedure::Polypectomy {
        for &code in tokens[anchor + 1..].iter().take_while(|&&tok| tok != "2") {
            if !pathology.mark(code) && code.starts_with("2M") {
                malignancy.push(code.into());
            }
        }
    }

    let entry = directory.lookup(raw_date, raw_dob, &surname);
    if entry.is_unknown() {
        event!(Level::DEBUG, "no practice record for {} on {}", surname, raw_date);
    }
    let dob = parse_compact(raw_dob).or_else(|| parse_compact(&entry.dob));

    Some(Episode {
        date,
        surname: surname.into(),
        mrn: entry.mrn,
        dob,
        doctor: entry.doctor,
        procedure,
        pathology,
        malignancy,
    })
}

/// Parse an extract, skipping its first (title) line.
pub fn parse_reader(reader: impl BufRead, directory: &DoctorDirectory) -> Result<Vec<Episode>> {
    let mut episodes = vec![];
    let mut skipped = 0;
    for line in reader.lines().skip(1) {
        match parse_line(&line?, directory) {
            Some(episode) => episodes.push(episode),
            None => skipped += 1,
        }
    }
    event!(
        Level::DEBUG,
        "parsed {} colonoscopies, skipped {} lines",
        episodes.len(),
        skipped
    );
    Ok(episodes)
}

/// Parse several extracts, keeping episodes in file order.
pub fn parse_files(
    paths: impl IntoIterator<Item = impl AsRef<Path>>,
    directory: &DoctorDirectory,
) -> Result<Vec<Episode>> {
    let mut episodes = vec![];
    for path in paths {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .with_context(|| format!("unable to open extract \"{}\"", path.display()))?;
        let parsed = parse_reader(io::BufReader::new(file), directory)
            .with_context(|| format!("while reading \"{}\"", path.display()))?;
        event!(
            Level::INFO,
            "{} colonoscopies from \"{}\"",
            parsed.len(),
            path.display()
        );
        episodes.extend(parsed);
    }
    Ok(episodes)
}

/// Write the intermediate episodes table.
pub fn write_episodes(path: impl AsRef<Path>, episodes: &[Episode]) -> Result {
    let path = path.as_ref();
    check_extension(path, "csv")?;
    let rows: Vec<EpisodeRow> = episodes.iter().map(Into::into).collect();
    save_csv(&rows, path)
}

/// Read the intermediate episodes table back.
pub fn load_episodes(path: impl AsRef<Path>) -> Result<Vec<Episode>> {
    let path = path.as_ref();
    let rows: Vec<EpisodeRow> = load_csv(path)?;
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            Episode::try_from(row)
                .with_context(|| format!("row {} of \"{}\"", idx + 2, path.display()))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doctors::DirectoryRow;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn directory() -> DoctorDirectory {
        DoctorDirectory::from_rows([DirectoryRow {
            date: "12-03-2024".into(),
            mrn: "1001".into(),
            endo: "Smith".into(),
            surname: "Brown".into(),
            dob: "1/02/1960".into(),
        }])
    }

    const POLYPECTOMY: &str = "H1 99 BROWN JANE F0001DOB01021960 12032024A M 04G 2M8211/0 \
        2M8213/0 2M8140/3 2 2M8263/0 32093-00 X";

    #[test]
    fn polypectomy_line() {
        let ep = parse_line(POLYPECTOMY, &directory()).unwrap();
        assert_eq!(ep.date, ymd(2024, 3, 12));
        assert_eq!(&*ep.surname, "brown");
        assert_eq!(ep.dob, Some(ymd(1960, 2, 1)));
        assert_eq!(&*ep.doctor, "smith");
        assert_eq!(&*ep.mrn, "1001");
        assert_eq!(ep.procedure, Procedure::Polypectomy);
        assert!(ep.pathology.tubular);
        assert!(ep.pathology.serrated);
        // after the terminating `2`
        assert!(!ep.pathology.tubulovillous);
        assert_eq!(ep.malignancy, vec![ArcStr::from("2M8140/3")]);
    }

    #[test]
    fn plain_colonoscopy_ignores_pathology() {
        let line = "H1 99 BROWN JANE F0001DOB01021960 12032024A M 04 2M8211/0 2 32090 X";
        let ep = parse_line(line, &directory()).unwrap();
        assert_eq!(ep.procedure, Procedure::Colonoscopy);
        assert!(!ep.pathology.has_polyp());
        assert!(ep.malignancy.is_empty());
    }

    #[test]
    fn plain_colonoscopy_code_wins() {
        assert_eq!(Procedure::find_in("32090,32093"), Some(Procedure::Colonoscopy));
        assert_eq!(Procedure::find_in("32093-00"), Some(Procedure::Polypectomy));
        assert_eq!(Procedure::find_in("30473"), None);

        let line = "H1 99 BROWN JANE F0001DOB01021960 12032024A M 04G 2M8211/0 2 32090,32093 X";
        let ep = parse_line(line, &directory()).unwrap();
        assert_eq!(ep.procedure, Procedure::Colonoscopy);
        assert!(!ep.pathology.has_polyp());
    }

    #[test]
    fn line_without_procedure_code_is_dropped() {
        let line = "H1 99 BROWN JANE F0001DOB01021960 12032024A M 04G 2M8211/0 2 30473 X";
        assert!(parse_line(line, &directory()).is_none());
    }

    #[test]
    fn line_without_anchor_is_dropped() {
        let line = "H1 99 BROWN JANE F0001DOB01021960 12032024A 05 2M8211/0 2 32093 X";
        assert!(parse_line(line, &directory()).is_none());
        assert!(parse_line("", &directory()).is_none());
    }

    #[test]
    fn bad_birth_date_uses_directory() {
        let line = "H1 99 BROWN JANE F0001DOB99999999 12032024A M 04G 2 32090 X";
        let ep = parse_line(line, &directory()).unwrap();
        // found by date + surname, and the practice's birth date used instead
        assert_eq!(ep.dob, Some(ymd(1960, 2, 1)));
        assert_eq!(&*ep.doctor, "smith");
    }

    #[test]
    fn unknown_patient_has_no_birth_date() {
        let line = "H1 99 GREY JOHN F0001DOB 13032024A M 04G 2 32090 X";
        let ep = parse_line(line, &directory()).unwrap();
        assert_eq!(ep.dob, None);
        assert_eq!(&*ep.doctor, "unknown");
        assert_eq!(&*ep.mrn, "?");
    }

    #[test]
    fn parse_reader_skips_title_line() {
        let input = format!("{}\n{}\nrubbish line\n", POLYPECTOMY, POLYPECTOMY);
        let episodes = parse_reader(input.as_bytes(), &directory()).unwrap();
        assert_eq!(episodes.len(), 1);
    }

    #[test]
    fn intermediate_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("adr.csv");
        let mut episodes = vec![parse_line(POLYPECTOMY, &directory()).unwrap()];
        let mut unknown = episodes[0].clone();
        unknown.dob = None;
        episodes.push(unknown);
        write_episodes(&path, &episodes).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,surname,mrn,dob,doc,procedure,ta,sa,tva,malig\n"));
        assert!(text.contains("12032024,brown,1001,01021960,smith,32093,ta,sa,,2M8140/3"));
        assert!(text.contains(",?,smith,"));

        assert_eq!(load_episodes(&path).unwrap(), episodes);
        assert!(write_episodes(dir.path().join("adr.txt"), &episodes).is_err());
    }
}
