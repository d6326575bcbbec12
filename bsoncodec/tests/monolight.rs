use std::{str::FromStr, sync::Arc};

use bsoncodec::{
    bson::{Bson, Document, doc, oid::ObjectId},
    model::skip_unknown_field,
    prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PowerStatus {
    On,
    Off,
}

impl PowerStatus {
    fn as_str(&self) -> &'static str {
        match self {
            PowerStatus::On => "on",
            PowerStatus::Off => "off",
        }
    }
}

impl FromStr for PowerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(PowerStatus::On),
            "off" => Ok(PowerStatus::Off),
            other => Err(format!("unknown power status {other}")),
        }
    }
}

/// Stores a power status as a boolean: `true` for on.
struct PowerStatusCodec;

impl Codec<PowerStatus> for PowerStatusCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &PowerStatus,
        _: &EncoderContext,
    ) -> CodecResult<()> {
        writer.write_boolean(*value == PowerStatus::On)
    }

    fn decode(&self, reader: &mut BsonReader<'_>, _: &DecoderContext) -> CodecResult<PowerStatus> {
        Ok(if reader.read_boolean()? {
            PowerStatus::On
        } else {
            PowerStatus::Off
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Monolight {
    power_status: Option<PowerStatus>,
    color_temperature: Option<i32>,
}

struct MonolightCodec {
    power_status: Arc<dyn Codec<Option<PowerStatus>>>,
    color_temperature: Arc<dyn Codec<Option<i32>>>,
}

impl MonolightCodec {
    fn new(registry: &CodecRegistry) -> CodecResult<Self> {
        Ok(Self {
            power_status: registry.get_nullable()?,
            color_temperature: registry.get_nullable()?,
        })
    }
}

impl Codec<Monolight> for MonolightCodec {
    fn encode(
        &self,
        writer: &mut BsonWriter,
        value: &Monolight,
        context: &EncoderContext,
    ) -> CodecResult<()> {
        let child = context.child();
        writer.write_start_document()?;
        writer.write_name("powerStatus")?;
        self.power_status
            .encode(writer, &value.power_status, &child)?;
        writer.write_name("colorTemperature")?;
        self.color_temperature
            .encode(writer, &value.color_temperature, &child)?;
        writer.write_end_document()
    }

    fn decode(
        &self,
        reader: &mut BsonReader<'_>,
        context: &DecoderContext,
    ) -> CodecResult<Monolight> {
        let mut light = Monolight {
            power_status: None,
            color_temperature: None,
        };
        reader.read_start_document()?;
        while reader.read_bson_type()?.is_some() {
            match reader.read_name()?.as_str() {
                "_id" => {
                    reader.read_object_id()?;
                }
                "powerStatus" => light.power_status = self.power_status.decode(reader, context)?,
                "colorTemperature" => {
                    light.color_temperature = self.color_temperature.decode(reader, context)?
                }
                other => skip_unknown_field(reader, context, "Monolight", other)?,
            }
        }
        reader.read_end_document()?;
        Ok(light)
    }
}

struct MonolightCodecProvider;

impl CodecProvider for MonolightCodecProvider {
    fn get(&self, key: TypeKey, registry: &CodecRegistry) -> CodecResult<Option<AnyCodec>> {
        if key.is::<PowerStatus>() {
            return Ok(Some(AnyCodec::new::<PowerStatus, _>(PowerStatusCodec)));
        }
        if key.is::<Monolight>() {
            return Ok(Some(AnyCodec::new::<Monolight, _>(MonolightCodec::new(
                registry,
            )?)));
        }
        Ok(None)
    }
}

fn registry() -> CodecRegistry {
    CodecRegistry::from_registries([
        default_registry(),
        CodecRegistry::from_provider(MonolightCodecProvider),
    ])
}

fn encode_field<T: 'static>(registry: &CodecRegistry, value: &T) -> Document {
    let codec = registry.get::<T>().unwrap();
    let mut writer = BsonWriter::new();
    writer.write_start_document().unwrap();
    writer.write_name("v").unwrap();
    codec
        .encode(&mut writer, value, &EncoderContext::default())
        .unwrap();
    writer.write_end_document().unwrap();
    writer.into_document().unwrap()
}

fn decode_field<T: 'static>(codec: &dyn Codec<T>, value: Bson) -> CodecResult<T> {
    let doc = doc! { "v": value };
    let mut reader = BsonReader::new(&doc);
    reader.read_start_document()?;
    reader.read_name()?;
    let decoded = codec.decode(&mut reader, &DecoderContext::default())?;
    reader.read_end_document()?;
    Ok(decoded)
}

#[test]
fn test_power_status_maps_to_boolean() {
    let registry = registry();

    let on = PowerStatus::from_str("on").unwrap();
    assert_eq!(encode_field(&registry, &on), doc! { "v": true });
    assert_eq!(
        encode_field(&registry, &PowerStatus::Off),
        doc! { "v": false }
    );

    let codec = registry.get::<PowerStatus>().unwrap();
    assert_eq!(
        decode_field(&*codec, Bson::Boolean(true)).unwrap().as_str(),
        "on"
    );
    assert_eq!(
        decode_field(&*codec, Bson::Boolean(false)).unwrap().as_str(),
        "off"
    );
}

#[test]
fn test_power_status_null_handling() {
    let registry = registry();

    let strict = registry.get::<PowerStatus>().unwrap();
    assert!(matches!(
        decode_field(&*strict, Bson::Null),
        Err(CodecError::Decoding(_))
    ));

    let nullable = registry.get_nullable::<PowerStatus>().unwrap();
    assert_eq!(decode_field(&*nullable, Bson::Null).unwrap(), None);
    assert_eq!(
        decode_field(&*nullable, Bson::Boolean(true)).unwrap(),
        Some(PowerStatus::On)
    );
}

#[test]
fn test_monolight_roundtrip() {
    let registry = registry();
    let light = Monolight {
        power_status: Some(PowerStatus::On),
        color_temperature: Some(5200),
    };

    let doc = registry.encode(&light).unwrap();
    assert_eq!(doc, doc! { "powerStatus": true, "colorTemperature": 5200 });
    assert_eq!(registry.decode::<Monolight>(&doc).unwrap(), light);

    let bytes = registry.to_vec(&light).unwrap();
    assert_eq!(registry.from_slice::<Monolight>(&bytes).unwrap(), light);
}

#[test]
fn test_monolight_writes_explicit_nulls() {
    let registry = registry();
    let light = Monolight {
        power_status: None,
        color_temperature: None,
    };

    let doc = registry.encode(&light).unwrap();
    assert_eq!(
        doc,
        doc! { "powerStatus": Bson::Null, "colorTemperature": Bson::Null }
    );
    assert_eq!(registry.decode::<Monolight>(&doc).unwrap(), light);
}

#[test]
fn test_monolight_ignores_id_and_unknown_fields() {
    let registry = registry();
    let doc = doc! {
        "_id": ObjectId::new(),
        "model": "MX-1",
        "powerStatus": false,
        "colorTemperature": 3200,
    };

    assert_eq!(
        registry.decode::<Monolight>(&doc).unwrap(),
        Monolight {
            power_status: Some(PowerStatus::Off),
            color_temperature: Some(3200),
        }
    );

    let strict = DecoderContext::builder().deny_unknown_fields(true).build();
    assert!(matches!(
        registry.decode_with::<Monolight>(&doc, &strict),
        Err(CodecError::Decoding(_))
    ));
}

#[test]
fn test_monolight_rejects_wrong_field_type() {
    let registry = registry();
    let doc = doc! { "powerStatus": "on", "colorTemperature": 5200 };
    assert!(matches!(
        registry.decode::<Monolight>(&doc),
        Err(CodecError::Decoding(_))
    ));
}

#[test]
fn test_monolight_without_provider_is_not_found() {
    let registry = default_registry();
    let err = registry.get::<Monolight>().err().unwrap();
    assert!(err.is_codec_not_found());
    assert!(err.to_string().contains("Monolight"));
}
