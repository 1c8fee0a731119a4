//! Declarative table-of-fields schema for the six output tables
//!
//! Each table names its source in the eligibility record, its parent table
//! and index column, and the fields it reads. Adding a column is a change
//! to the tables below; the walker in [`super::normalizer`] never names a
//! field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value of `data_source` on every provider row
pub const DATA_SOURCE: &str = "CMS_QPP_API";

/// Allowed `qpStatus` values
pub const QP_STATUS_VALUES: &[&str] = &["Y", "N", "P", "Q", "R"];

/// Allowed `qpScoreType` values
pub const QP_SCORE_TYPE_VALUES: &[&str] = &["MI", "ME", "AE", "AT", "AI"];

/// Allowed `extremeHardshipSources` entries
pub const HARDSHIP_SOURCE_VALUES: &[&str] = &["auto-fema", "manual", "auto-covid"];

/// Allowed `lowVolStusRsnCd` codes
pub const LOW_VOLUME_REASON_VALUES: &[&str] = &[
    "BENE",
    "CHRG",
    "SRVC",
    "BOTH",
    "BENE/SRVC",
    "CHRG/SRVC",
    "ALL",
    "",
];

/// The six normalized tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Providers,
    Organizations,
    IndividualScenarios,
    GroupScenarios,
    Apms,
    VirtualGroups,
}

impl TableKind {
    /// Every table, in export order
    pub const ALL: [TableKind; 6] = [
        TableKind::Providers,
        TableKind::Organizations,
        TableKind::IndividualScenarios,
        TableKind::GroupScenarios,
        TableKind::Apms,
        TableKind::VirtualGroups,
    ];

    pub fn as_str(&self) -> &'static str {
        self.schema().name
    }

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            TableKind::Providers => &PROVIDERS,
            TableKind::Organizations => &ORGANIZATIONS,
            TableKind::IndividualScenarios => &INDIVIDUAL_SCENARIOS,
            TableKind::GroupScenarios => &GROUP_SCENARIOS,
            TableKind::Apms => &APMS,
            TableKind::VirtualGroups => &VIRTUAL_GROUPS,
        }
    }

    /// Column names in output order
    pub fn columns(&self) -> Vec<&'static str> {
        self.schema().columns()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| format!("Unknown table: {s}"))
    }
}

/// Where a table's rows come from, relative to the parent's node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The record itself, one row
    Root,
    /// An optional nested object, zero or one row
    Object(&'static str),
    /// An optional array, one row per element
    Array(&'static str),
}

/// How a JSON value is read into a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Array of strings joined with ", "
    TextList,
    /// Array of objects; `key` of each joined with ", "
    CodeList { key: &'static str },
}

impl ValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Text => "Text",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::Boolean => "Boolean",
            ValueKind::TextList | ValueKind::CodeList { .. } => "Text (comma-separated list)",
        }
    }
}

/// Value restriction checked after type conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    None,
    OneOf(&'static [&'static str]),
    OneOfInt(&'static [i64]),
    /// Exactly this many ASCII digits
    Digits(usize),
}

impl Constraint {
    /// Checks a text value, returning the failure reason
    pub fn check_text(&self, value: &str) -> Result<(), String> {
        match self {
            Constraint::OneOf(allowed) if !allowed.contains(&value) => Err(format!(
                "value '{value}' not in allowed set [{}]",
                allowed.join(", ")
            )),
            Constraint::Digits(n)
                if value.len() != *n || !value.bytes().all(|b| b.is_ascii_digit()) =>
            {
                Err(format!("expected exactly {n} digits"))
            }
            _ => Ok(()),
        }
    }

    /// Checks an integer value, returning the failure reason
    pub fn check_int(&self, value: i64) -> Result<(), String> {
        match self {
            Constraint::OneOfInt(allowed) if !allowed.contains(&value) => {
                let allowed: Vec<String> = allowed.iter().map(i64::to_string).collect();
                Err(format!(
                    "value {value} not in allowed set [{}]",
                    allowed.join(", ")
                ))
            }
            _ => Ok(()),
        }
    }

    fn example(&self) -> Option<String> {
        match self {
            Constraint::OneOf(allowed) => Some(
                allowed
                    .iter()
                    .filter(|v| !v.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
            Constraint::OneOfInt(allowed) => Some(
                allowed
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
            Constraint::Digits(n) => Some("1".repeat(*n)),
            Constraint::None => None,
        }
    }
}

/// One column read from the record
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: &'static str,
    /// JSON pointer relative to the table's node
    pub pointer: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    pub constraint: Constraint,
    /// JSON pointer relative to the record root, read when `pointer` is
    /// absent or null
    pub fallback: Option<&'static str>,
    pub description: &'static str,
}

impl FieldSpec {
    const fn new(column: &'static str, pointer: &'static str, kind: ValueKind) -> Self {
        Self {
            column,
            pointer,
            kind,
            required: false,
            constraint: Constraint::None,
            fallback: None,
            description: "",
        }
    }

    const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    const fn one_of(self, allowed: &'static [&'static str]) -> Self {
        Self {
            constraint: Constraint::OneOf(allowed),
            ..self
        }
    }

    const fn one_of_int(self, allowed: &'static [i64]) -> Self {
        Self {
            constraint: Constraint::OneOfInt(allowed),
            ..self
        }
    }

    const fn digits(self, count: usize) -> Self {
        Self {
            constraint: Constraint::Digits(count),
            ..self
        }
    }

    const fn or_from(self, fallback: &'static str) -> Self {
        Self {
            fallback: Some(fallback),
            ..self
        }
    }

    const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Description for the data dictionary
    pub fn description(&self) -> String {
        if self.description.is_empty() {
            format!("{} read from `{}`", self.kind.type_name(), self.pointer)
        } else {
            self.description.to_string()
        }
    }

    /// Example value for the data dictionary
    pub fn example(&self) -> String {
        if let Some(example) = self.constraint.example() {
            return example;
        }
        match self.kind {
            ValueKind::Boolean => "TRUE/FALSE".to_string(),
            ValueKind::Integer => "1".to_string(),
            ValueKind::Float => "123.45".to_string(),
            ValueKind::Text => "Sample text".to_string(),
            ValueKind::TextList | ValueKind::CodeList { .. } => "A, B".to_string(),
        }
    }
}

const fn text(column: &'static str, pointer: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::Text)
}

const fn integer(column: &'static str, pointer: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::Integer)
}

const fn float(column: &'static str, pointer: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::Float)
}

const fn boolean(column: &'static str, pointer: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::Boolean)
}

const fn text_list(column: &'static str, pointer: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::TextList)
}

const fn code_list(column: &'static str, pointer: &'static str, key: &'static str) -> FieldSpec {
    FieldSpec::new(column, pointer, ValueKind::CodeList { key })
}

/// Columns computed from the fetch rather than read from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedColumn {
    /// `RawRecord.fetched_at` as RFC 3339
    ProcessedAt,
    /// Always [`DATA_SOURCE`]
    DataSource,
}

impl DerivedColumn {
    pub fn column(&self) -> &'static str {
        match self {
            DerivedColumn::ProcessedAt => "processed_at",
            DerivedColumn::DataSource => "data_source",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DerivedColumn::ProcessedAt => "Timestamp when the record was fetched (RFC 3339, UTC)",
            DerivedColumn::DataSource => "Source of the data (CMS_QPP_API)",
        }
    }
}

/// Declarative description of one output table
#[derive(Debug)]
pub struct TableSchema {
    pub kind: TableKind,
    pub name: &'static str,
    pub parent: Option<TableKind>,
    pub source: Source,
    /// Column holding the element index for array sources
    pub index_column: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    pub derived: &'static [DerivedColumn],
}

impl TableSchema {
    /// Key columns: npi, year, then the index column of every ancestor and
    /// of this table
    pub fn key_columns(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(schema) = current {
            if let Some(index) = schema.index_column {
                chain.push(index);
            }
            current = schema.parent.map(|p| p.schema());
        }
        chain.reverse();

        let mut keys = vec!["npi", "year"];
        keys.extend(chain);
        keys
    }

    /// All columns in output order
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = self.key_columns();
        columns.extend(self.fields.iter().map(|f| f.column));
        columns.extend(self.derived.iter().map(DerivedColumn::column));
        columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns().iter().position(|c| *c == column)
    }

    /// Tables whose parent is `parent`, in export order
    pub fn children_of(parent: Option<TableKind>) -> impl Iterator<Item = &'static TableSchema> {
        TableKind::ALL
            .into_iter()
            .map(|kind| kind.schema())
            .filter(move |schema| schema.parent == parent && schema.source != Source::Root)
    }
}

/// Description of a key column for the data dictionary
pub fn key_column_description(column: &str) -> &'static str {
    match column {
        "npi" => "National Provider Identifier - unique 10-digit ID for healthcare providers",
        "year" => "Performance year for the data (e.g., 2023, 2024, 2025)",
        "org_index" => "Index of organization within provider record (starts at 0)",
        "apm_index" => "Index of APM within organization record (starts at 0)",
        "virtual_group_index" => "Index of virtual group within organization record (starts at 0)",
        _ => "Key column",
    }
}

/// The record's own identifier, validated before any row is emitted
pub const NPI_FIELD: FieldSpec = text("npi", "/npi").required().digits(10);

pub static PROVIDERS: TableSchema = TableSchema {
    kind: TableKind::Providers,
    name: "providers",
    parent: None,
    source: Source::Root,
    index_column: None,
    fields: &[
        text("firstName", "/firstName")
            .required()
            .describe("Provider first name"),
        text("lastName", "/lastName")
            .required()
            .describe("Provider last name"),
        text("middleName", "/middleName").describe("Provider middle name or initial"),
        integer(
            "nationalProviderIdentifierType",
            "/nationalProviderIdentifierType",
        )
        .one_of_int(&[1, 2])
        .describe("Type of provider: 1=Individual, 2=Organization"),
        text("firstApprovedDate", "/firstApprovedDate")
            .describe("First date enrollment was approved for this NPI"),
        integer("yearsInMedicare", "/yearsInMedicare")
            .describe("Number of years the provider has been in Medicare"),
        integer("pecosEnrollmentDate", "/pecosEnrollmentDate")
            .describe("Year of enrollment in PECOS system"),
        boolean("newlyEnrolled", "/newlyEnrolled")
            .describe("TRUE if provider is newly enrolled in current year"),
        text("qpStatus", "/qpStatus")
            .one_of(QP_STATUS_VALUES)
            .describe("Qualifying APM Participant status (Y/N/P/Q/R)"),
        boolean("isMaqi", "/isMaqi").describe("TRUE if granted MAQI Demonstration Waiver"),
        text("qpScoreType", "/qpScoreType")
            .one_of(QP_SCORE_TYPE_VALUES)
            .describe("Category for QP participant (MI/ME/AE/AT/AI)"),
        boolean("amsMipsEligibleClinician", "/amsMipsEligibleClinician")
            .describe("TRUE if eligible for MIPS"),
        text("specialtyDescription", "/specialty/specialtyDescription")
            .or_from("/organizations/0/individualScenario/specialty/specialtyDescription")
            .describe("Provider specialty, falling back to the first organization's"),
        text("categoryReference", "/specialty/categoryReference")
            .or_from("/organizations/0/individualScenario/specialty/categoryReference"),
        text("typeDescription", "/specialty/typeDescription")
            .or_from("/organizations/0/individualScenario/specialty/typeDescription"),
    ],
    derived: &[DerivedColumn::ProcessedAt, DerivedColumn::DataSource],
};

pub static ORGANIZATIONS: TableSchema = TableSchema {
    kind: TableKind::Organizations,
    name: "organizations",
    parent: None,
    source: Source::Array("/organizations"),
    index_column: Some("org_index"),
    fields: &[
        text("TIN", "/TIN")
            .required()
            .describe("Taxpayer Identification Number (masked)"),
        text("prvdrOrgName", "/prvdrOrgName").describe("Organization or practice name"),
        boolean("isFacilityBased", "/isFacilityBased")
            .describe("TRUE if facility-based encounters threshold met"),
        text("addressLineOne", "/addressLineOne").describe("Primary address line"),
        text("addressLineTwo", "/addressLineTwo").describe("Secondary address line"),
        text("city", "/city").describe("Organization city"),
        text("zip", "/zip").describe("Nine-digit ZIP code"),
        text("state", "/state").describe("State abbreviation"),
        text("hospitalVbpName", "/hospitalVbpName")
            .describe("Hospital Value-Based Purchasing Program facility name"),
    ],
    derived: &[],
};

pub static INDIVIDUAL_SCENARIOS: TableSchema = TableSchema {
    kind: TableKind::IndividualScenarios,
    name: "individual_scenarios",
    parent: Some(TableKind::Organizations),
    source: Source::Object("/individualScenario"),
    index_column: None,
    fields: &[
        boolean("aciHardship", "/aciHardship").describe("TRUE if ACI Hardship Exemption approved"),
        boolean("aciReweighting", "/aciReweighting")
            .describe("TRUE if meets ACI Reweighting conditions"),
        integer("aggregationLevel", "/aggregationLevel")
            .one_of_int(&[1, 2])
            .describe("Aggregation level (1 or 2)"),
        boolean("ambulatorySurgicalCenter", "/ambulatorySurgicalCenter")
            .describe("TRUE if meets ASC threshold"),
        integer("eligibilityScenario", "/eligibilityScenario"),
        boolean("extremeHardship", "/extremeHardship")
            .describe("TRUE if received Extreme Hardship Exemption"),
        text("extremeHardshipEventType", "/extremeHardshipEventType")
            .describe("Type of extreme hardship event"),
        boolean("extremeHardship_quality", "/extremeHardshipReasons/quality"),
        boolean(
            "extremeHardship_improvementActivities",
            "/extremeHardshipReasons/improvementActivities",
        ),
        boolean("extremeHardship_aci", "/extremeHardshipReasons/aci"),
        boolean("extremeHardship_cost", "/extremeHardshipReasons/cost"),
        text_list("extremeHardshipSources", "/extremeHardshipSources")
            .one_of(HARDSHIP_SOURCE_VALUES),
        boolean("hasHospitalVbpCCN", "/hasHospitalVbpCCN"),
        boolean("hasPaymentAdjustmentCCN", "/hasPaymentAdjustmentCCN"),
        boolean("hospitalBasedClinician", "/hospitalBasedClinician"),
        text("hospitalVbpName", "/hospitalVbpName"),
        float("hospitalVbpScore", "/hospitalVbpScore"),
        boolean("hpsaClinician", "/hpsaClinician"),
        boolean("iaStudy", "/iaStudy"),
        boolean("isEligible_individual", "/isEligible/individual"),
        boolean("isEligible_group", "/isEligible/group"),
        boolean("isEligible_mipsApm", "/isEligible/mipsApm"),
        boolean("isEligible_virtualGroup", "/isEligible/virtualGroup"),
        boolean("isFacilityBased", "/isFacilityBased"),
        boolean("isOptedIn", "/isOptedIn"),
        boolean("isOptInEligible", "/isOptInEligible"),
        integer("lowVolumeServices", "/lowVolumeServices"),
        code_list(
            "lowVolumeStatusReasons",
            "/lowVolumeStatusReasons",
            "lowVolStusRsnCd",
        )
        .one_of(LOW_VOLUME_REASON_VALUES),
        boolean("lowVolumeSwitch", "/lowVolumeSwitch")
            .describe("TRUE if fell below low volume threshold"),
        boolean("mipsEligibleSwitch", "/mipsEligibleSwitch")
            .describe("TRUE if provider type eligible for MIPS"),
        boolean("nonPatientFacing", "/nonPatientFacing")
            .describe("TRUE if patient-facing encounters met threshold"),
        text("optInDecisionDate", "/optInDecisionDate"),
        boolean("ruralClinician", "/ruralClinician")
            .describe("TRUE if has claims with rural ZIP designation"),
        boolean("smallGroupPractitioner", "/smallGroupPractitioner"),
        text("specialtyCode", "/specialtyCode"),
        text("specialty_description", "/specialty/specialtyDescription"),
        text("specialty_categoryReference", "/specialty/categoryReference"),
        text("specialty_typeDescription", "/specialty/typeDescription"),
    ],
    derived: &[],
};

pub static GROUP_SCENARIOS: TableSchema = TableSchema {
    kind: TableKind::GroupScenarios,
    name: "group_scenarios",
    parent: Some(TableKind::Organizations),
    source: Source::Object("/groupScenario"),
    index_column: None,
    fields: &[
        boolean("aciHardship", "/aciHardship"),
        boolean("aciReweighting", "/aciReweighting"),
        integer("aggregationLevel", "/aggregationLevel").one_of_int(&[1, 2]),
        boolean("ambulatorySurgicalCenter", "/ambulatorySurgicalCenter"),
        boolean("extremeHardship", "/extremeHardship"),
        text("extremeHardshipEventType", "/extremeHardshipEventType"),
        boolean("extremeHardship_quality", "/extremeHardshipReasons/quality"),
        boolean(
            "extremeHardship_improvementActivities",
            "/extremeHardshipReasons/improvementActivities",
        ),
        boolean("extremeHardship_aci", "/extremeHardshipReasons/aci"),
        boolean("extremeHardship_cost", "/extremeHardshipReasons/cost"),
        text_list("extremeHardshipSources", "/extremeHardshipSources")
            .one_of(HARDSHIP_SOURCE_VALUES),
        boolean("hospitalBasedClinician", "/hospitalBasedClinician"),
        boolean("hpsaClinician", "/hpsaClinician"),
        boolean("iaStudy", "/iaStudy"),
        boolean("isEligible_group", "/isEligible/group"),
        boolean("isFacilityBased", "/isFacilityBased"),
        boolean("isOptedIn", "/isOptedIn"),
        boolean("isOptInEligible", "/isOptInEligible"),
        integer("lowVolumeServices", "/lowVolumeServices"),
        code_list(
            "lowVolumeStatusReasons",
            "/lowVolumeStatusReasons",
            "lowVolStusRsnCd",
        )
        .one_of(LOW_VOLUME_REASON_VALUES),
        boolean("lowVolumeSwitch", "/lowVolumeSwitch"),
        boolean("mipsEligibleSwitch", "/mipsEligibleSwitch"),
        boolean("nonPatientFacing", "/nonPatientFacing"),
        text("optInDecisionDate", "/optInDecisionDate"),
        boolean("ruralClinician", "/ruralClinician"),
        boolean("smallGroupPractitioner", "/smallGroupPractitioner"),
    ],
    derived: &[],
};

pub static APMS: TableSchema = TableSchema {
    kind: TableKind::Apms,
    name: "apms",
    parent: Some(TableKind::Organizations),
    source: Source::Array("/apms"),
    index_column: Some("apm_index"),
    fields: &[
        text("entityName", "/entityName").describe("Official APM entity name"),
        boolean("lvtFlag", "/lvtFlag"),
        float("lvtPayments", "/lvtPayments"),
        integer("lvtPatients", "/lvtPatients"),
        boolean("lvtSmallStatus", "/lvtSmallStatus"),
        integer("lvtPerformanceYear", "/lvtPerformanceYear"),
        text("apmId", "/apmId").describe("APM Program identifier"),
        text("apmName", "/apmName").describe("Formal APM Program name"),
        text("subdivisionId", "/subdivisionId"),
        text("subdivisionName", "/subdivisionName"),
        boolean("advancedApmFlag", "/advancedApmFlag").describe("TRUE if Advanced APM"),
        boolean("mipsApmFlag", "/mipsApmFlag").describe("TRUE if MIPS APM"),
        text("providerRelationshipCode", "/providerRelationshipCode"),
        float("qpPatientScores_ae", "/qpPatientScores/ae"),
        float("qpPatientScores_ai", "/qpPatientScores/ai"),
        float("qpPatientScores_at", "/qpPatientScores/at"),
        float("qpPatientScores_me", "/qpPatientScores/me"),
        float("qpPatientScores_mi", "/qpPatientScores/mi"),
        float("qpPaymentScores_ae", "/qpPaymentScores/ae"),
        float("qpPaymentScores_ai", "/qpPaymentScores/ai"),
        float("qpPaymentScores_at", "/qpPaymentScores/at"),
        float("qpPaymentScores_me", "/qpPaymentScores/me"),
        float("qpPaymentScores_mi", "/qpPaymentScores/mi"),
        float("complexPatientScore", "/complexPatientScore")
            .describe("Composite Complex-Patient Score (0.00-5.00)"),
        float("finalQpcScore", "/finalQpcScore").describe("Final Quality Payment Score"),
        boolean("extremeHardship", "/extremeHardship"),
        boolean("extremeHardship_quality", "/extremeHardshipReasons/quality"),
        boolean(
            "extremeHardship_improvementActivities",
            "/extremeHardshipReasons/improvementActivities",
        ),
        boolean("extremeHardship_aci", "/extremeHardshipReasons/aci"),
        boolean("extremeHardship_cost", "/extremeHardshipReasons/cost"),
        text("extremeHardshipEventType", "/extremeHardshipEventType"),
        text_list("extremeHardshipSources", "/extremeHardshipSources")
            .one_of(HARDSHIP_SOURCE_VALUES),
        boolean("isOptedIn", "/isOptedIn"),
    ],
    derived: &[],
};

pub static VIRTUAL_GROUPS: TableSchema = TableSchema {
    kind: TableKind::VirtualGroups,
    name: "virtual_groups",
    parent: Some(TableKind::Organizations),
    source: Source::Array("/virtualGroups"),
    index_column: Some("virtual_group_index"),
    fields: &[
        text("virtualGroupIdentifier", "/virtualGroupIdentifier"),
        text("claimsTypes", "/claimsTypes"),
        boolean("lowVolumeSwitch", "/lowVolumeSwitch"),
        code_list(
            "lowVolumeStatusReasons",
            "/lowVolumeStatusReasons",
            "lowVolStusRsnCd",
        )
        .one_of(LOW_VOLUME_REASON_VALUES),
        integer("beneficiaryCount", "/beneficiaryCount"),
        float("allowedCharges", "/allowedCharges"),
        text("hospitalVbpName", "/hospitalVbpName"),
        boolean("isFacilityBased", "/isFacilityBased"),
        float("hospitalVbpScore", "/hospitalVbpScore"),
        boolean(
            "specialScenario_aciReweighting",
            "/specialScenario/aciReweighting",
        ),
        boolean(
            "specialScenario_nonPatientFacing",
            "/specialScenario/nonPatientFacing",
        ),
        boolean(
            "specialScenario_ruralClinician",
            "/specialScenario/ruralClinician",
        ),
        boolean(
            "specialScenario_hpsaClinician",
            "/specialScenario/hpsaClinician",
        ),
        boolean(
            "specialScenario_hospitalBasedClinician",
            "/specialScenario/hospitalBasedClinician",
        ),
        boolean(
            "specialScenario_ambulatorySurgicalCenter",
            "/specialScenario/ambulatorySurgicalCenter",
        ),
        boolean("specialScenario_aciHardship", "/specialScenario/aciHardship"),
        boolean("specialScenario_iaStudy", "/specialScenario/iaStudy"),
        boolean(
            "specialScenario_smallGroupPractitioner",
            "/specialScenario/smallGroupPractitioner",
        ),
        boolean(
            "specialScenario_extremeHardship",
            "/specialScenario/extremeHardship",
        ),
        text(
            "specialScenario_extremeHardshipEventType",
            "/specialScenario/extremeHardshipEventType",
        ),
    ],
    derived: &[],
};
