//! Delta document parsers

use crate::error::{ParseError, ParseResult, ProviderError};
use crate::provider::DeltaProvider;
use crate::xml::{self, Element};
use dm_core::{
    DatabaseEngine, Delta, DeltaId, Direction, EngineArtifacts, Package, SchedulerJob,
    StoredFunction,
};

/// Turns raw delta content into a `Delta` for one direction.
///
/// The provider is passed on every call; a parser never keeps a reference
/// to the provider it reads from.
pub trait DeltaParser: Send + Sync {
    /// Engine whose delta variant this parser produces
    fn engine(&self) -> DatabaseEngine;

    /// Fetch and parse the content of an available `id`
    fn parse(
        &self,
        provider: &dyn DeltaProvider,
        id: &DeltaId,
        direction: Direction,
    ) -> ParseResult<Delta>;
}

/// Top-level elements a delta document may contain
const KNOWN_SECTIONS: &[&str] = &[
    "summary", "schema", "up", "down", "packages", "jobs", "functions",
];

/// Parser for XML delta documents
#[derive(Debug, Clone, Copy)]
pub struct XmlDeltaParser {
    engine: DatabaseEngine,
}

impl XmlDeltaParser {
    pub fn new(engine: DatabaseEngine) -> Self {
        Self { engine }
    }
}

impl DeltaParser for XmlDeltaParser {
    fn engine(&self) -> DatabaseEngine {
        self.engine
    }

    fn parse(
        &self,
        provider: &dyn DeltaProvider,
        id: &DeltaId,
        direction: Direction,
    ) -> ParseResult<Delta> {
        let bytes = provider.delta_content(id)?;
        let order = provider
            .catalog()
            .and_then(|catalog| catalog.order_of(id))
            .ok_or_else(|| ProviderError::NotFound { id: id.clone() })?;

        let doc = Document {
            engine: self.engine,
            provider,
            id,
            direction,
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| doc.malformed(format!("content is not UTF-8: {}", e)))?;
        let root = xml::parse_document(text).map_err(|message| doc.malformed(message))?;
        let delta = doc.build(&root, order)?;

        log::debug!(
            "Parsed delta {} ({}): {} statements",
            id,
            direction,
            delta.statements().len()
        );
        Ok(delta)
    }
}

/// State for turning one parsed document into a `Delta`
struct Document<'a> {
    engine: DatabaseEngine,
    provider: &'a dyn DeltaProvider,
    id: &'a DeltaId,
    direction: Direction,
}

impl Document<'_> {
    fn malformed(&self, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            id: self.id.clone(),
            message: message.into(),
        }
    }

    fn shape_mismatch(&self, artifact: impl Into<String>) -> ParseError {
        ParseError::ShapeMismatch {
            id: self.id.clone(),
            engine: self.engine,
            artifact: artifact.into(),
        }
    }

    fn unique<'e>(&self, parent: &'e Element, name: &str) -> ParseResult<Option<&'e Element>> {
        parent.unique_child(name).map_err(|m| self.malformed(m))
    }

    fn required_name(&self, element: &Element) -> ParseResult<String> {
        match element.attribute("name").map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(self.malformed(format!("<{}> requires a name attribute", element.name))),
        }
    }

    fn build(&self, root: &Element, order: usize) -> ParseResult<Delta> {
        if root.name != "delta" {
            return Err(self.malformed(format!(
                "root element is <{}>, expected <delta>",
                root.name
            )));
        }
        self.check_header(root)?;
        self.check_sections(root)?;

        let summary = self
            .unique(root, "summary")?
            .and_then(Element::trimmed_text)
            .unwrap_or_default()
            .to_string();
        let schema = self
            .unique(root, "schema")?
            .and_then(Element::trimmed_text)
            .map(str::to_string);

        let section = self
            .unique(root, self.direction.as_str())?
            .ok_or_else(|| ParseError::MissingDirection {
                id: self.id.clone(),
                direction: self.direction,
            })?;
        let ddl = self.statements(section)?;

        let artifacts = match self.engine {
            DatabaseEngine::Oracle => EngineArtifacts::Oracle {
                packages: match (self.direction, self.unique(root, "packages")?) {
                    (Direction::Up, Some(packages)) => self.packages(packages)?,
                    _ => Vec::new(),
                },
                jobs: match self.unique(root, "jobs")? {
                    Some(jobs) => self.jobs(jobs)?,
                    None => Vec::new(),
                },
            },
            DatabaseEngine::MySql => EngineArtifacts::MySql {
                functions: match (self.direction, self.unique(root, "functions")?) {
                    (Direction::Up, Some(functions)) => self.functions(functions)?,
                    _ => Vec::new(),
                },
            },
        };

        Delta::new(self.id.clone(), order, self.direction, self.engine)
            .with_summary(summary)
            .with_schema(schema)
            .with_ddl(ddl)
            .with_artifacts(artifacts)
            .map_err(|_| self.shape_mismatch("artifacts"))
    }

    /// `id` and `engine` attributes, when present, must match the request
    fn check_header(&self, root: &Element) -> ParseResult<()> {
        if let Some(raw) = root.attribute("id") {
            let declared = DeltaId::parse(raw).map_err(|e| self.malformed(e.to_string()))?;
            if &declared != self.id {
                return Err(self.malformed(format!("document declares id '{}'", declared)));
            }
        }
        if let Some(raw) = root.attribute("engine") {
            let declared: DatabaseEngine = raw
                .parse()
                .map_err(|e: dm_core::CoreError| self.malformed(e.to_string()))?;
            if declared != self.engine {
                return Err(self.shape_mismatch(format!("engine=\"{}\"", raw)));
            }
        }
        Ok(())
    }

    /// Reject unknown sections and artifacts of the other engine
    fn check_sections(&self, root: &Element) -> ParseResult<()> {
        for child in &root.children {
            let name = child.name.as_str();
            if !KNOWN_SECTIONS.contains(&name) {
                return Err(self.malformed(format!("unexpected element <{}>", name)));
            }
            let foreign = match self.engine {
                DatabaseEngine::Oracle => name == "functions",
                DatabaseEngine::MySql => name == "packages" || name == "jobs",
            };
            if foreign {
                return Err(self.shape_mismatch(name));
            }
        }
        Ok(())
    }

    /// Statements of an `<up>`/`<down>` section, in source order
    fn statements(&self, section: &Element) -> ParseResult<Vec<String>> {
        if section.children.is_empty() {
            return Ok(section
                .trimmed_text()
                .map(|text| vec![text.to_string()])
                .unwrap_or_default());
        }
        if section.trimmed_text().is_some() {
            return Err(self.malformed(format!(
                "<{}> mixes raw text with <statement> elements",
                section.name
            )));
        }

        let mut statements = Vec::with_capacity(section.children.len());
        for child in &section.children {
            if child.name != "statement" {
                return Err(self.malformed(format!(
                    "unexpected element <{}> in <{}>",
                    child.name, section.name
                )));
            }
            if let Some(text) = child.trimmed_text() {
                statements.push(text.to_string());
            }
        }
        Ok(statements)
    }

    fn resource(&self, path: &str) -> ParseResult<String> {
        let bytes = self.provider.resource_content(self.id, path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| self.malformed(format!("'{}' is not UTF-8: {}", path, e)))?;
        Ok(text.trim().to_string())
    }

    fn packages(&self, packages: &Element) -> ParseResult<Vec<Package>> {
        let mut out = Vec::new();
        for package in &packages.children {
            if package.name != "package" {
                return Err(self.malformed(format!(
                    "unexpected element <{}> in <packages>",
                    package.name
                )));
            }
            let name = self.required_name(package)?;
            let head = self
                .unique(package, "pkg")?
                .and_then(Element::trimmed_text)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}/pkg.sql", name));
            let body = self
                .unique(package, "pkg_body")?
                .and_then(Element::trimmed_text)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}/pkg_body.sql", name));

            out.push(Package {
                head_source: self.resource(&head)?,
                body_source: self.resource(&body)?,
                name,
            });
        }
        Ok(out)
    }

    fn jobs(&self, jobs: &Element) -> ParseResult<Vec<SchedulerJob>> {
        let mut out = Vec::new();
        for job in &jobs.children {
            if job.name != "job" {
                return Err(self.malformed(format!(
                    "unexpected element <{}> in <jobs>",
                    job.name
                )));
            }
            let name = self.required_name(job)?;
            // A job without a section for this direction contributes nothing.
            let Some(section) = self.unique(job, self.direction.as_str())? else {
                continue;
            };
            for statement in self.statements(section)? {
                out.push(SchedulerJob {
                    name: name.clone(),
                    statement,
                });
            }
        }
        Ok(out)
    }

    fn functions(&self, functions: &Element) -> ParseResult<Vec<StoredFunction>> {
        let mut out = Vec::new();
        for function in &functions.children {
            if function.name != "function" {
                return Err(self.malformed(format!(
                    "unexpected element <{}> in <functions>",
                    function.name
                )));
            }
            let name = self.required_name(function)?;
            let src = function
                .attribute("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.sql", name));
            out.push(StoredFunction {
                source: self.resource(&src)?,
                name,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
