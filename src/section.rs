/// Paged areas of the forum that list stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    Frontpage,
    New,
    Ask,
    Show,
    Favorites,
    Submissions,
    Upvoted,
}

impl Section {
    /// Path template relative to the forum root; `{id}` is a user id.
    pub fn path_template(self) -> &'static str {
        match self {
            Self::Frontpage => "",
            Self::New => "newest",
            Self::Ask => "ask",
            Self::Show => "show",
            Self::Favorites => "favorites?id={id}",
            Self::Submissions => "submitted?id={id}",
            Self::Upvoted => "upvoted?id={id}",
        }
    }

    pub fn needs_id(self) -> bool {
        self.path_template().contains("{id}")
    }

    /// Upvotes are private and only visible to a logged-in owner.
    pub fn needs_login(self) -> bool {
        matches!(self, Self::Upvoted)
    }

    pub fn start_path(self, id: Option<&str>) -> anyhow::Result<String> {
        let template = self.path_template();
        if !self.needs_id() {
            return Ok(template.to_owned());
        }

        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow::anyhow!("section {self:?} needs a user id (--id or --user)"))?;
        let encoded = url::form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>();
        Ok(template.replace("{id}", &encoded))
    }
}
