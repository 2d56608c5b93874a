//! Types de données pour le crate shp

use geo::Geometry;

/// Valeur d'un champ de la table attributaire (.dbf)
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Texte brut, décodé octet par octet (Latin-1)
    Text(String),
    /// Numérique sans décimales
    Integer(i64),
    /// Numérique avec décimales
    Number(f64),
    /// Booléen (champ `L`)
    Logical(bool),
    /// Champ vide ou illisible
    Null,
}

/// Attributs d'un enregistrement, dans l'ordre des champs du .dbf
pub type Properties = Vec<(String, FieldValue)>;

/// Un enregistrement brut: géométrie dans le CRS source, attributs non décodés
#[derive(Debug, Clone)]
pub struct Record {
    /// Géométrie (`None` pour un shape Null)
    pub geometry: Option<Geometry>,

    /// Attributs (vide si le .dbf est absent)
    pub properties: Properties,
}

/// Descripteur d'un champ du .dbf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Nom du champ (11 caractères max)
    pub name: String,

    /// Type dBASE (`C`, `N`, `F`, `L`, `D`, ...)
    pub field_type: u8,

    /// Longueur en octets
    pub length: usize,

    /// Nombre de décimales
    pub decimals: u8,
}

/// Informations extraites du fichier .prj
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrjInfo {
    /// Nom du PROJCS (ex: "Korea_2000_Central_Belt_2010")
    pub name: Option<String>,

    /// Code EPSG déduit (AUTHORITY ou table de noms connus)
    pub epsg: Option<u32>,

    /// Paramètres Transverse Mercator, si présents
    pub transverse_mercator: Option<TmParameters>,
}

/// Paramètres d'une projection Transverse Mercator lus dans le WKT
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TmParameters {
    pub latitude_of_origin: f64,
    pub central_meridian: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}
