//! Loaded catalog tree and its hierarchical queries

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;
use crate::model::{DeviceFamily, Firmware, Project, Selection};

/// Flash method identifier for the library-style backend
pub const ESPTOOL_METHOD: &str = "esptool";

/// The complete firmware catalog, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    projects: Vec<Project>,
}

impl Catalog {
    /// Build a catalog from projects, linking every firmware to its family
    /// and rejecting duplicate identifiers.
    pub fn new(mut projects: Vec<Project>) -> Result<Self, CatalogError> {
        let mut project_ids = HashSet::new();
        let mut firmware_ids = HashSet::new();

        for project in &mut projects {
            if !project_ids.insert(project.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "project",
                    id: project.id,
                });
            }

            let mut family_ids = HashSet::new();
            for family in &mut project.families {
                if !family_ids.insert(family.id) {
                    return Err(CatalogError::DuplicateId {
                        kind: "device family",
                        id: family.id,
                    });
                }
                for firmware in &mut family.firmware {
                    if !firmware_ids.insert(firmware.id) {
                        return Err(CatalogError::DuplicateId {
                            kind: "firmware",
                            id: firmware.id,
                        });
                    }
                    firmware.family_id = family.id;
                }
            }
        }

        debug!(
            "Catalog linked: {} project(s), {} firmware(s)",
            projects.len(),
            firmware_ids.len()
        );
        Ok(Self { projects })
    }

    /// Parse a catalog from its JSON document form
    pub fn from_json(document: &str) -> Result<Self, CatalogError> {
        let raw: Catalog = serde_json::from_str(document)?;
        Self::new(raw.projects)
    }

    /// Drop every family not flashed with esptool, and projects left empty
    pub fn esptool_only(self) -> Self {
        let projects = self
            .projects
            .into_iter()
            .filter_map(|mut project| {
                project
                    .families
                    .retain(|family| family.flash_method == ESPTOOL_METHOD);
                (!project.families.is_empty()).then_some(project)
            })
            .collect();
        Self { projects }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// All projects in display order
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Look up a project by id
    pub fn project(&self, project_id: u32) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    /// Device families of a project in display order
    pub fn families(&self, project_id: u32) -> Result<&[DeviceFamily], CatalogError> {
        self.project(project_id)
            .map(|p| p.families.as_slice())
            .ok_or(CatalogError::NotFound {
                kind: "project",
                id: project_id,
            })
    }

    /// Look up a device family inside a project
    pub fn family(&self, project_id: u32, family_id: u32) -> Result<&DeviceFamily, CatalogError> {
        self.families(project_id)?
            .iter()
            .find(|f| f.id == family_id)
            .ok_or(CatalogError::NotFound {
                kind: "device family",
                id: family_id,
            })
    }

    /// Firmware of a family in display order
    pub fn firmware(&self, project_id: u32, family_id: u32) -> Result<&[Firmware], CatalogError> {
        self.family(project_id, family_id)
            .map(|f| f.firmware.as_slice())
    }

    /// Find a firmware anywhere in the tree by its id
    pub fn find_firmware(&self, firmware_id: u32) -> Option<Selection> {
        self.projects
            .iter()
            .flat_map(|p| p.families.iter())
            .find_map(|family| {
                family
                    .firmware
                    .iter()
                    .find(|fw| fw.id == firmware_id)
                    .map(|fw| Selection {
                        family: family.clone(),
                        firmware: fw.clone(),
                    })
            })
    }
}
