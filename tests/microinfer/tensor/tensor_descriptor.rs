use anyhow::Result;
use microinfer::tensor::{compute_strides, is_compact, numel};
use microinfer::{DataType, Device, TensorDescriptor, TensorDescriptorMut};

#[test]
fn descriptor_views_borrow_without_copying() -> Result<()> {
    let data = [1.5f32, -2.0, 3.25, 0.0, 8.0, 1.0];
    let shape = [2i64, 3];
    let view = TensorDescriptor::from_slice(&data, DataType::F32, &shape);
    assert_eq!(view.rank(), 2);
    assert_eq!(view.numel(), 6);
    assert_eq!(view.byte_size(), 24);
    assert_eq!(view.device(), Device::cpu(0));
    assert!(view.is_compact());
    let typed = view.as_slice::<f32>().expect("dense f32 view");
    assert!(std::ptr::eq(typed.as_ptr(), data.as_ptr()));
    Ok(())
}

#[test]
fn strided_views_are_not_compact() -> Result<()> {
    let data = [0u8; 6];
    let shape = [2i64, 3];
    let strides = [1i64, 2];
    let view = TensorDescriptor::with_strides(&data, Device::default(), DataType::U8, &shape, &strides);
    assert!(!view.is_compact());
    assert!(view.as_slice::<u8>().is_none());
    assert_eq!(&compute_strides(&shape)[..], &[3, 1]);
    assert!(is_compact(&[1, 4], Some(&[9, 1][..])));
    assert_eq!(numel(&[2, 0, 5]), 0);
    Ok(())
}

#[test]
fn mutable_descriptor_writes_through() -> Result<()> {
    let mut data = [0i32; 4];
    let shape = [4i64];
    {
        let mut view = TensorDescriptorMut::from_slice(&mut data, DataType::I32, &shape);
        view.as_mut_slice::<i32>().expect("dense i32 view")[2] = 7;
        assert_eq!(view.as_view().as_slice::<i32>(), Some(&[0, 0, 7, 0][..]));
    }
    assert_eq!(data, [0, 0, 7, 0]);
    Ok(())
}

#[test]
fn dtype_text_forms_parse() -> Result<()> {
    assert_eq!("int8".parse::<DataType>()?, DataType::I8);
    assert_eq!("float32x4".parse::<DataType>()?, DataType::F32.with_lanes(4));
    assert_eq!("bool".parse::<DataType>()?, DataType::BOOL);
    assert_eq!(DataType::U16.to_string(), "uint16");
    assert!("complex64".parse::<DataType>().is_err());
    Ok(())
}
