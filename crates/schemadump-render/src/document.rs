/// Named block of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Table key the section belongs to.
    pub key: String,
    pub body: String,
}

/// Rendered dump split into header, table sections, and trailer sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpDocument {
    /// Line comment marker of the format. Formats without comments drop the header.
    pub comment_prefix: Option<String>,
    pub header: Vec<String>,
    pub sections: Vec<Section>,
    /// Deferred constraints, one section per referenced table.
    pub trailer: Vec<Section>,
}

impl DumpDocument {
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn trailer_section(&self, key: &str) -> Option<&Section> {
        self.trailer.iter().find(|section| section.key == key)
    }

    /// Join all parts with blank lines between blocks.
    pub fn to_text(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if let Some(prefix) = &self.comment_prefix {
            if !self.header.is_empty() {
                let header: Vec<String> = self
                    .header
                    .iter()
                    .map(|line| format!("{prefix} {line}"))
                    .collect();
                blocks.push(header.join("\n"));
            }
        }

        blocks.extend(self.sections.iter().map(|section| section.body.clone()));
        blocks.extend(self.trailer.iter().map(|section| section.body.clone()));

        let mut text = blocks.join("\n\n");
        text.push('\n');
        text
    }
}
