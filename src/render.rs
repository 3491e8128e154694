use sanitize_filename::sanitize;

use crate::video::{ContentType, Options, ParsedFile};

fn value(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

impl ParsedFile {
    /// The name the file should be renamed to, relative to the library root.
    ///
    /// Placeholders: `{n}` name, `{y}` year, `{s}` season, `{e}` episode,
    /// `{x}` episode name, `{r}` resolution, `{q}` quality. Anything else in
    /// the template is kept as written.
    pub fn target_name(&self, options: &Options) -> String {
        let name = match self.content_type {
            Some(ContentType::Movie) => options.movie_format.clone(),
            Some(ContentType::Series) => options
                .series_format
                .replace("{s}", value(&self.season))
                .replace("{e}", value(&self.episode))
                .replace("{x}", &sanitize(value(&self.episode_name))),
            _ => self.file_name.clone(),
        };

        let name = name
            .replace("{n}", &sanitize(&self.clean_name))
            .replace("{r}", value(&self.resolution))
            .replace("{q}", value(&self.quality))
            .replace("{y}", value(&self.year));

        // Templates ending in an empty placeholder leave a dangling dot.
        let name = name.trim_matches(' ');
        let name = name.strip_suffix('.').unwrap_or(name);

        format!("{}{}", name, self.extension)
    }
}
